use serde::{Deserialize, Serialize};

/// Output page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    #[serde(rename_all = "camelCase")]
    Custom {
        width_mm: f32,
        height_mm: f32,
    },
}

impl PageSize {
    /// Width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width_mm, height_mm } => (width_mm, height_mm),
        }
    }
}

/// Per-job settings forwarded verbatim to the render boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionConfig {
    pub page_size: PageSize,
    pub margin_mm: f32,
    /// Explicit primary font. When unset the primary font is taken from the
    /// document's own root styles.
    pub default_font: Option<String>,
    pub title: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin_mm: 20.0,
            default_font: None,
            title: None,
        }
    }
}

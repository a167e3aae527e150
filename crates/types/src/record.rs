use crate::SharedFontData;
use crate::font::{FontStyle, FontWeight};
use crate::requirement::FontKey;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontDataError {
    #[error("Font data is empty")]
    Empty,

    #[error("Unreadable font data: {0}")]
    Unreadable(String),

    #[error("Font has no family name")]
    MissingFamily,
}

/// A user-supplied font persisted in the custom font store.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomFontRecord {
    /// Stable, caller-assigned identifier.
    pub id: String,
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub bytes: SharedFontData,
    pub size_bytes: usize,
}

impl CustomFontRecord {
    pub fn new(
        id: impl Into<String>,
        family: impl Into<String>,
        weight: FontWeight,
        style: FontStyle,
        bytes: impl Into<SharedFontData>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            id: id.into(),
            family: family.into(),
            weight,
            style,
            size_bytes: bytes.len(),
            bytes,
        }
    }

    /// Builds a record by reading family, weight and slant from the font's
    /// own `name` and `OS/2` tables.
    pub fn from_font_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FontDataError> {
        if bytes.is_empty() {
            return Err(FontDataError::Empty);
        }
        let (family, weight, style) = {
            let face = ttf_parser::Face::parse(&bytes, 0)
                .map_err(|e| FontDataError::Unreadable(e.to_string()))?;

            let family_of = |id: u16| {
                face.names()
                    .into_iter()
                    .filter(|n| n.name_id == id)
                    .find_map(|n| n.to_string())
            };
            let family = family_of(ttf_parser::name_id::TYPOGRAPHIC_FAMILY)
                .or_else(|| family_of(ttf_parser::name_id::FAMILY))
                .filter(|f| !f.trim().is_empty())
                .ok_or(FontDataError::MissingFamily)?;

            let weight = FontWeight::new(face.weight().to_number() as u32);
            let style = if face.is_italic() { FontStyle::Italic } else { FontStyle::Normal };
            (family, weight, style)
        };
        Ok(Self::new(id, family, weight, style, Arc::new(bytes)))
    }

    pub fn key(&self) -> FontKey {
        FontKey::new(&self.family, self.weight, self.style)
    }
}

impl std::fmt::Debug for CustomFontRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomFontRecord")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tracks_payload() {
        let record = CustomFontRecord::new("a", "Brand Sans", FontWeight::BOLD, FontStyle::Normal, vec![0u8; 128]);
        assert_eq!(record.size_bytes, 128);
        assert_eq!(record.key(), FontKey::new("brand sans", FontWeight::BOLD, FontStyle::Normal));
    }

    #[test]
    fn from_font_bytes_rejects_garbage() {
        assert_eq!(
            CustomFontRecord::from_font_bytes("x", Vec::new()).unwrap_err(),
            FontDataError::Empty
        );
        assert!(matches!(
            CustomFontRecord::from_font_bytes("x", b"definitely not a font".to_vec()),
            Err(FontDataError::Unreadable(_))
        ));
    }
}

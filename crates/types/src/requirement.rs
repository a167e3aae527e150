use crate::font::{FontStyle, FontWeight, normalize_family};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a font face: normalized family plus weight and style.
///
/// Two requirements with the same key are the same font regardless of how
/// the family was spelled in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontKey {
    family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl FontKey {
    pub fn new(family: &str, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: normalize_family(family),
            weight,
            style,
        }
    }

    /// The normalized (lowercase, whitespace-collapsed) family name.
    pub fn family(&self) -> &str {
        &self.family
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.family, self.weight, self.style)
    }
}

/// Where the bytes for a required font will come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontOrigin {
    /// Bundled with the render engine.
    System,
    /// Uploaded by the user into the custom font store.
    Custom,
    /// Fetched from the remote font-serving API.
    Remote,
}

/// A distinct (family, weight, style) a document needs, with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontRequirement {
    /// Display form of the family (quotes stripped, whitespace collapsed,
    /// original casing kept). This is what remote requests are made with.
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub origin: FontOrigin,
}

impl FontRequirement {
    pub fn new(family: &str, weight: FontWeight, style: FontStyle, origin: FontOrigin) -> Self {
        let display = family
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            family: display,
            weight,
            style,
            origin,
        }
    }

    pub fn key(&self) -> FontKey {
        FontKey::new(&self.family, self.weight, self.style)
    }
}

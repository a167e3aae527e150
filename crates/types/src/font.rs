use serde::{Deserialize, Serialize, de};
use std::fmt;

/// A CSS font weight on the 100..=900 scale, snapped to the nearest hundred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FontWeight(u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const REGULAR: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Builds a weight from any integer, clamping to 100..=900 and rounding
    /// to the nearest hundred (the granularity remote font APIs serve).
    pub fn new(value: u32) -> Self {
        let clamped = value.clamp(100, 900);
        let snapped = ((clamped + 50) / 100) * 100;
        FontWeight(snapped.min(900) as u16)
    }

    /// Returns the numeric weight value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Parses a `font-weight` value (e.g. `bold`, `600`, `normal`).
    ///
    /// Relative keywords are approximated against the regular weight since
    /// there is no inherited weight at detection time.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thin" | "hairline" => Ok(FontWeight::THIN),
            "lighter" | "light" => Ok(FontWeight::LIGHT),
            "regular" | "normal" => Ok(FontWeight::REGULAR),
            "medium" => Ok(FontWeight::MEDIUM),
            "bold" | "bolder" => Ok(FontWeight::BOLD),
            "black" | "heavy" => Ok(FontWeight::BLACK),
            other => other
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(|n| FontWeight::new(n.round() as u32))
                .ok_or_else(|| format!("Invalid font weight: '{}'", s)),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::REGULAR
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FontWeightDef {
            Str(String),
            Num(u32),
        }

        match FontWeightDef::deserialize(deserializer)? {
            FontWeightDef::Str(s) => Self::parse(&s).map_err(de::Error::custom),
            FontWeightDef::Num(n) => Ok(FontWeight::new(n)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    /// Parses a `font-style` value. `oblique` is treated as italic.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.split_whitespace().next() {
            Some("normal") => Some(FontStyle::Normal),
            Some("italic") | Some("oblique") => Some(FontStyle::Italic),
            _ => None,
        }
    }

    pub fn is_italic(self) -> bool {
        self == FontStyle::Italic
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontStyle::Normal => f.write_str("normal"),
            FontStyle::Italic => f.write_str("italic"),
        }
    }
}

/// Normalizes a family name for comparison: surrounding quotes stripped,
/// inner whitespace collapsed to single spaces, lowercased.
pub fn normalize_family(family: &str) -> String {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

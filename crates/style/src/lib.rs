//! Style scanning and font requirement detection.
//!
//! - [`stylesheet`]: splits style text into rules and declarations
//! - [`parsers`]: nom parsers for font-related property values
//! - [`source`]: pulls style text out of HTML documents
//! - [`detector`]: turns declarations into deduplicated [`FontRequirement`]s
//!
//! [`FontRequirement`]: fontweave_types::FontRequirement

pub mod detector;
pub mod parsers;
pub mod source;
pub mod stylesheet;

pub use detector::{DEFAULT_BUNDLED_FONTS, DetectionReport, FontDetector};
pub use parsers::FontShorthand;
pub use source::{StyleSource, extract_style_text};
pub use stylesheet::{Declaration, StyleParseError, StyleRule, parse_rules};

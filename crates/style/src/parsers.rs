//! Low-level nom parser functions for font-related style values.
//!
//! This module provides composable parsers for declarations, family lists
//! and the `font` shorthand.

use fontweave_types::{FontStyle, FontWeight};
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::{map, rest};
use nom::multi::separated_list1;
use nom::sequence::{delimited, separated_pair};
use nom::{IResult, Parser};

/// Generic families and CSS-wide keywords. A family list led by one of these
/// asks for no specific font.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "math",
    "emoji",
    "fangsong",
    "-apple-system",
    "blinkmacsystemfont",
    "inherit",
    "initial",
    "unset",
    "revert",
    "revert-layer",
    "default",
];

/// `font` shorthand values that name a system font instead of a family list.
const SYSTEM_FONT_KEYWORDS: &[&str] = &["caption", "icon", "menu", "message-box", "small-caption", "status-bar"];

const ABSOLUTE_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large", "smaller", "larger",
];

// --- Helper Parsers ---

fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
    ))
    .parse(input)
}

fn bare_family(input: &str) -> IResult<&str, &str> {
    map(take_while1(|c: char| c != ',' && c != '"' && c != '\''), str::trim).parse(input)
}

fn property_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_').parse(input)
}

// --- Public Parsers ---

/// Parses a comma-separated `font-family` list, unquoting entries.
pub fn parse_family_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), ws(alt((quoted, bare_family)))).parse(input)
}

/// Parses a single `property: value` declaration.
pub fn parse_declaration(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(ws(property_name), char(':'), map(rest, str::trim)).parse(input)
}

pub fn is_generic_family(family: &str) -> bool {
    let lower = family.trim().to_ascii_lowercase();
    GENERIC_FAMILIES.contains(&lower.as_str())
}

/// The primary requested family of a `font-family` value: its first entry,
/// unless that entry is a generic keyword.
pub fn primary_family(value: &str) -> Option<String> {
    let (_, families) = parse_family_list(value).ok()?;
    let first = families.first()?.split_whitespace().collect::<Vec<_>>().join(" ");
    if first.is_empty() || is_generic_family(&first) {
        None
    } else {
        Some(first)
    }
}

/// Strips a trailing `!important` flag.
pub fn strip_important(value: &str) -> &str {
    let trimmed = value.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    match lower.rfind("!important") {
        Some(idx) if lower[idx..].trim_end() == "!important" => trimmed[..idx].trim_end(),
        _ => trimmed,
    }
}

/// The parts of a `font` shorthand declaration relevant to font selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontShorthand {
    pub family: Option<String>,
    pub weight: FontWeight,
    pub style: FontStyle,
}

fn is_font_size_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    let size_part = lower.split('/').next().unwrap_or("");
    if ABSOLUTE_SIZE_KEYWORDS.contains(&size_part) {
        return true;
    }
    let mut chars = size_part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() || c == '.' => {
            let unit: String = size_part.chars().skip_while(|c| c.is_ascii_digit() || *c == '.').collect();
            !unit.is_empty()
        }
        _ => false,
    }
}

/// Parses `font: [style] [variant] [weight] [stretch] size[/line-height] family-list`.
///
/// Returns `None` for system font keywords and values without a size.
pub fn parse_font_shorthand(value: &str) -> Option<FontShorthand> {
    let value = value.trim();
    if SYSTEM_FONT_KEYWORDS.contains(&value.to_ascii_lowercase().as_str()) {
        return None;
    }

    let mut weight = FontWeight::REGULAR;
    let mut style = FontStyle::Normal;
    let mut remaining = value;

    loop {
        remaining = remaining.trim_start();
        let token_end = remaining.find(char::is_whitespace).unwrap_or(remaining.len());
        let token = &remaining[..token_end];
        if token.is_empty() {
            return None;
        }
        if is_font_size_token(token) {
            remaining = &remaining[token_end..];
            break;
        }
        let lower = token.to_ascii_lowercase();
        if let Some(s) = FontStyle::parse(&lower).filter(|s| s.is_italic()) {
            style = s;
        } else if lower != "normal" {
            if let Ok(w) = FontWeight::parse(&lower) {
                weight = w;
            }
        }
        remaining = &remaining[token_end..];
    }

    // A spaced-out line height (`12px / 1.4 Family`).
    let mut remaining = remaining.trim_start();
    if let Some(after_slash) = remaining.strip_prefix('/') {
        let after_slash = after_slash.trim_start();
        let lh_end = after_slash.find(char::is_whitespace).unwrap_or(after_slash.len());
        remaining = &after_slash[lh_end..];
    }

    Some(FontShorthand {
        family: primary_family(remaining),
        weight,
        style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_list_unquotes_entries() {
        let (_, list) = parse_family_list(r#" "Open Sans" , 'Noto Serif', Arial Black , serif"#).unwrap();
        assert_eq!(list, vec!["Open Sans", "Noto Serif", "Arial Black", "serif"]);
    }

    #[test]
    fn primary_family_skips_generic_leaders() {
        assert_eq!(primary_family("Roboto, sans-serif"), Some("Roboto".to_string()));
        assert_eq!(primary_family("sans-serif"), None);
        assert_eq!(primary_family("SERIF, Roboto"), None);
        assert_eq!(primary_family("inherit"), None);
        assert_eq!(primary_family("  Fira   Code , monospace"), Some("Fira Code".to_string()));
    }

    #[test]
    fn declaration_splits_property_and_value() {
        let (_, (prop, value)) = parse_declaration("  font-family :  'Lato', serif ").unwrap();
        assert_eq!(prop, "font-family");
        assert_eq!(value, "'Lato', serif");
        assert!(parse_declaration(": orphan").is_err());
    }

    #[test]
    fn important_flag_is_removed() {
        assert_eq!(strip_important("Roboto !important"), "Roboto");
        assert_eq!(strip_important("bold!IMPORTANT "), "bold");
        assert_eq!(strip_important("Roboto"), "Roboto");
    }

    #[test]
    fn shorthand_with_style_weight_and_line_height() {
        let font = parse_font_shorthand(r#"italic 700 16px/1.5 "Merriweather", serif"#).unwrap();
        assert_eq!(font.family.as_deref(), Some("Merriweather"));
        assert_eq!(font.weight, FontWeight::BOLD);
        assert_eq!(font.style, FontStyle::Italic);
    }

    #[test]
    fn shorthand_defaults_and_spaced_line_height() {
        let font = parse_font_shorthand("12pt / 1.2 Inter, sans-serif").unwrap();
        assert_eq!(font.family.as_deref(), Some("Inter"));
        assert_eq!(font.weight, FontWeight::REGULAR);
        assert_eq!(font.style, FontStyle::Normal);

        let font = parse_font_shorthand("small-caps bold large Georgia").unwrap();
        assert_eq!(font.family.as_deref(), Some("Georgia"));
        assert_eq!(font.weight, FontWeight::BOLD);
    }

    #[test]
    fn shorthand_rejects_system_keywords_and_missing_size() {
        assert!(parse_font_shorthand("caption").is_none());
        assert!(parse_font_shorthand("bold Roboto").is_none());
        assert_eq!(parse_font_shorthand("1rem monospace").unwrap().family, None);
    }
}

//! Extracts style text from source documents.

/// The style content of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSource<'a> {
    /// Style sheet text: `<style>` element bodies, or the whole input when it
    /// carries no markup.
    pub sheets: Vec<&'a str>,
    /// Bodies of `style="..."` attributes, in document order. These are bare
    /// declaration lists and never contain rules.
    pub inline: Vec<&'a str>,
}

impl StyleSource<'_> {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty() && self.inline.is_empty()
    }
}

/// Splits `document` into the style text it carries.
///
/// Input containing any tag is treated as markup: only `<style>` bodies and
/// `style` attributes are collected and the surrounding text is ignored.
/// Anything else is assumed to already be style text.
pub fn extract_style_text(document: &str) -> StyleSource<'_> {
    let lower = document.to_ascii_lowercase();
    if !contains_markup(&lower) {
        return StyleSource {
            sheets: vec![document],
            inline: Vec::new(),
        };
    }

    StyleSource {
        sheets: style_elements(document, &lower),
        inline: inline_style_attributes(document, &lower),
    }
}

/// Whether `lower` has something shaped like a tag, comment or doctype:
/// `<` directly followed by a letter, `/` or `!`.
fn contains_markup(lower: &str) -> bool {
    lower
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || w[1] == b'/' || w[1] == b'!'))
}

fn style_elements<'a>(document: &'a str, lower: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(idx) = lower[pos..].find("<style") {
        let tag_start = pos + idx;
        pos = tag_start + "<style".len();
        // `<styles>` or `<style-guide>` are other elements.
        let boundary = lower[pos..].chars().next();
        if !boundary.is_some_and(|c| c == '>' || c == '/' || c.is_whitespace()) {
            continue;
        }
        let Some(tag_end) = lower[pos..].find('>').map(|i| pos + i + 1) else {
            break;
        };
        let body_end = lower[tag_end..].find("</style").map_or(document.len(), |i| tag_end + i);
        found.push(&document[tag_end..body_end]);
        pos = body_end;
    }
    found
}

fn inline_style_attributes<'a>(document: &'a str, lower: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(idx) = lower[pos..].find("style") {
        let at = pos + idx;
        pos = at + "style".len();

        // Must be a standalone attribute name inside an open tag.
        let preceded_by_space = lower[..at].chars().next_back().is_some_and(char::is_whitespace);
        if !preceded_by_space || !inside_tag(&lower[..at]) {
            continue;
        }
        let after = lower[pos..].trim_start();
        let Some(after_eq) = after.strip_prefix('=') else {
            continue;
        };
        let after_eq = after_eq.trim_start();
        let Some(quote) = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value_start = lower.len() - after_eq.len() + 1;
        if let Some(len) = lower[value_start..].find(quote) {
            found.push(&document[value_start..value_start + len]);
            pos = value_start + len + 1;
        }
    }
    found
}

fn inside_tag(before: &str) -> bool {
    match (before.rfind('<'), before.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

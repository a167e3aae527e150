//! Splits style text into rules and declarations.
//!
//! This is deliberately not a full CSS parser: it understands comments,
//! quoted strings, nested conditional at-rules and declaration blocks, which
//! is all font detection needs.

use crate::parsers::{parse_declaration, strip_important};
use thiserror::Error;

/// Errors that can occur while scanning style text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleParseError {
    #[error("Unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),

    #[error("Unclosed block starting at byte {0}")]
    UnclosedBlock(usize),

    #[error("Unexpected '}}' at byte {0}")]
    UnexpectedClose(usize),
}

/// A `property: value` pair. Property names are lowercased; values keep
/// their original text minus any `!important` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Selector text; empty for bare declaration lists (inline styles).
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Whether the rule targets the document root (`:root`, `html`, `body`, `*`).
    pub fn targets_root(&self) -> bool {
        self.selector
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .any(|s| matches!(s.as_str(), ":root" | "html" | "body" | "*"))
    }
}

/// At-rules whose blocks contain further rules.
const NESTING_AT_RULES: &[&str] = &["@media", "@supports", "@layer", "@container", "@document", "@scope"];

/// Parses style text into rules. Text without any block is treated as a
/// single inline declaration list.
pub fn parse_rules(text: &str) -> Result<Vec<StyleRule>, StyleParseError> {
    let css = strip_comments(text)?;
    let mut rules = Vec::new();
    if find_unquoted(&css, &['{', '}']).is_none() {
        let declarations = parse_declarations(&css);
        if !declarations.is_empty() {
            rules.push(StyleRule {
                selector: String::new(),
                declarations,
            });
        }
        return Ok(rules);
    }
    parse_rule_list(&css, 0, &mut rules)?;
    Ok(rules)
}

fn parse_rule_list(input: &str, base: usize, rules: &mut Vec<StyleRule>) -> Result<(), StyleParseError> {
    let mut pos = 0;
    while let Some((idx, ch)) = find_unquoted(&input[pos..], &['{', '}']) {
        let open = pos + idx;
        if ch == '}' {
            return Err(StyleParseError::UnexpectedClose(base + open));
        }
        let close = matching_brace(input, open).ok_or(StyleParseError::UnclosedBlock(base + open))?;

        // Statements such as `@import url(x);` may precede the prelude.
        let prelude = input[pos..open].rsplit(';').next().unwrap_or("").trim();
        let body = &input[open + 1..close];
        let lower = prelude.to_ascii_lowercase();

        if NESTING_AT_RULES.iter().any(|at| lower.starts_with(at)) {
            parse_rule_list(body, base + open + 1, rules)?;
        } else if !lower.starts_with('@') {
            rules.push(StyleRule {
                selector: prelude.to_string(),
                declarations: parse_declarations(body),
            });
        }
        // Other at-rules (@font-face, @page, @keyframes) declare no requirements.
        pos = close + 1;
    }
    Ok(())
}

/// Splits a declaration block on unquoted `;` and parses each entry.
/// Entries that are not `property: value` are skipped.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut rest = body;
    loop {
        let end = find_unquoted(rest, &[';']).map_or(rest.len(), |(i, _)| i);
        let chunk = rest[..end].trim();
        if !chunk.is_empty() {
            match parse_declaration(chunk) {
                Ok((_, (property, value))) => declarations.push(Declaration {
                    property: property.to_ascii_lowercase(),
                    value: strip_important(value).to_string(),
                }),
                Err(_) => log::debug!("Skipping malformed declaration: {}", chunk),
            }
        }
        if end >= rest.len() {
            break;
        }
        rest = &rest[end + 1..];
    }
    declarations
}

/// Returns the byte index and character of the first of `targets` outside
/// quotes and parentheses (so `url(a;b)` never splits).
fn find_unquoted(s: &str, targets: &[char]) -> Option<(usize, char)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut parens = 0usize;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => parens += 1,
            (None, ')') => parens = parens.saturating_sub(1),
            (None, c) if parens == 0 && targets.contains(&c) => return Some((i, c)),
            _ => {}
        }
    }
    None
}

fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = open;
    while let Some((idx, ch)) = find_unquoted(&s[pos..], &['{', '}']) {
        let at = pos + idx;
        if ch == '{' {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
        }
        pos = at + 1;
    }
    None
}

fn strip_comments(text: &str) -> Result<String, StyleParseError> {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == '\\' {
                    if let Some((_, next)) = chars.next() {
                        out.push(next);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '/' && matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(StyleParseError::UnterminatedComment(i));
                }
                out.push(' ');
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    Ok(out)
}

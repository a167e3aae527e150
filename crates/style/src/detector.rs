//! Font requirement detection.
//!
//! The detector walks every rule of a document's style text, picks the
//! primary family of each `font-family` (or `font`) declaration, pairs it
//! with the weight and style declared in the same rule and classifies the
//! result by where its bytes will come from.

use crate::parsers::{parse_font_shorthand, primary_family};
use crate::source::extract_style_text;
use crate::stylesheet::{StyleParseError, StyleRule, parse_declarations, parse_rules};
use fontweave_cache::BoundedLruCache;
use fontweave_types::{FontKey, FontOrigin, FontRequirement, FontStyle, FontWeight, font::normalize_family};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Families the render engine ships with.
pub const DEFAULT_BUNDLED_FONTS: &[&str] = &[
    "Libertinus Serif",
    "Libertinus Sans",
    "Libertinus Mono",
    "New Computer Modern",
    "New Computer Modern Math",
    "DejaVu Sans Mono",
    "Helvetica",
    "Times New Roman",
    "Courier",
];

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// The outcome of scanning one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionReport {
    /// One entry per distinct key, sorted by key.
    pub requirements: Vec<FontRequirement>,
    /// The font the document's body text is set in, if any family is declared.
    pub primary: Option<FontKey>,
}

impl DetectionReport {
    pub fn find(&self, key: &FontKey) -> Option<&FontRequirement> {
        self.requirements.iter().find(|r| &r.key() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// Detects font requirements and memoizes reports by content hash.
pub struct FontDetector {
    bundled: HashSet<String>,
    cache: Mutex<BoundedLruCache<String, Arc<DetectionReport>>>,
}

impl FontDetector {
    pub fn new(cache_capacity: usize) -> Self {
        Self::with_bundled_fonts(cache_capacity, DEFAULT_BUNDLED_FONTS.iter().copied())
    }

    pub fn with_bundled_fonts<I, S>(cache_capacity: usize, bundled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bundled: bundled.into_iter().map(|f| normalize_family(f.as_ref())).collect(),
            cache: Mutex::new(BoundedLruCache::new(cache_capacity)),
        }
    }

    pub fn is_bundled(&self, family: &str) -> bool {
        self.bundled.contains(&normalize_family(family))
    }

    /// Scans `document` (HTML or bare style text) for font requirements.
    ///
    /// `custom_families` are the normalized families currently in the custom
    /// font store; they take part in the cache key so a report is never
    /// reused after the store changes. With `bypass_cache` set the report is
    /// recomputed and not stored.
    ///
    /// Only the first entry of a family list is requested. A list led by a
    /// generic keyword (`monospace, Fira Code`) yields no requirement, since
    /// the render engine satisfies generics from its bundled fonts.
    pub fn detect(
        &self,
        document: &str,
        custom_families: &[String],
        bypass_cache: bool,
    ) -> Result<Arc<DetectionReport>, StyleParseError> {
        let cache_key = content_hash(document, custom_families);
        if !bypass_cache {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(report) = cache.get(&cache_key) {
                log::debug!("Detection cache hit for {}", &cache_key[..12]);
                return Ok(Arc::clone(report));
            }
        }

        let report = Arc::new(self.scan(document, custom_families)?);
        log::debug!(
            "Detected {} font requirement(s), primary: {:?}",
            report.requirements.len(),
            report.primary.as_ref().map(|k| k.to_string())
        );

        if !bypass_cache {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            cache.set(cache_key, Arc::clone(&report));
        }
        Ok(report)
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).size()
    }

    fn scan(&self, document: &str, custom_families: &[String]) -> Result<DetectionReport, StyleParseError> {
        let source = extract_style_text(document);
        let mut rules = Vec::new();
        for sheet in &source.sheets {
            rules.extend(parse_rules(sheet)?);
        }
        rules.extend(source.inline.iter().map(|body| StyleRule {
            selector: String::new(),
            declarations: parse_declarations(body),
        }));
        let custom: HashSet<String> = custom_families.iter().map(|f| normalize_family(f)).collect();

        let mut found: BTreeMap<FontKey, FontRequirement> = BTreeMap::new();
        let mut first_key = None;
        let mut root_key = None;

        for rule in &rules {
            let Some((family, weight, style)) = rule_font(rule) else {
                continue;
            };
            let normalized = normalize_family(&family);
            let origin = if custom.contains(&normalized) {
                FontOrigin::Custom
            } else if self.bundled.contains(&normalized) {
                FontOrigin::System
            } else {
                FontOrigin::Remote
            };
            let requirement = FontRequirement::new(&family, weight, style, origin);
            let key = requirement.key();
            if first_key.is_none() {
                first_key = Some(key.clone());
            }
            if root_key.is_none() && rule.targets_root() {
                root_key = Some(key.clone());
            }
            found.entry(key).or_insert(requirement);
        }

        Ok(DetectionReport {
            requirements: found.into_values().collect(),
            primary: root_key.or(first_key),
        })
    }
}

impl std::fmt::Debug for FontDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontDetector")
            .field("bundled", &self.bundled.len())
            .field("cached_reports", &self.cached_reports())
            .finish()
    }
}

/// Resolves the (family, weight, style) a single rule asks for. Later
/// declarations override earlier ones; a `font` shorthand resets weight and
/// style.
fn rule_font(rule: &StyleRule) -> Option<(String, FontWeight, FontStyle)> {
    let mut family = None;
    let mut weight = FontWeight::REGULAR;
    let mut style = FontStyle::Normal;

    for decl in &rule.declarations {
        match decl.property.as_str() {
            "font-family" => family = primary_family(&decl.value),
            "font-weight" => {
                if let Ok(w) = FontWeight::parse(&decl.value) {
                    weight = w;
                }
            }
            "font-style" => {
                if let Some(s) = FontStyle::parse(&decl.value) {
                    style = s;
                }
            }
            "font" => {
                if let Some(shorthand) = parse_font_shorthand(&decl.value) {
                    family = shorthand.family;
                    weight = shorthand.weight;
                    style = shorthand.style;
                }
            }
            _ => {}
        }
    }

    family.map(|f| (f, weight, style))
}

fn content_hash(text: &str, custom_families: &[String]) -> String {
    let mut families: Vec<String> = custom_families.iter().map(|f| normalize_family(f)).collect();
    families.sort();
    families.dedup();

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    for family in &families {
        hasher.update([0u8]);
        hasher.update(family.as_bytes());
    }
    hex::encode(hasher.finalize())
}

//! Builds the font collection handed to the render engine.

use crate::error::JobError;
use fontweave_types::{
    ErrorKind, FontCollection, FontEntry, FontKey, FontOrigin, FontRequirement, FontStyle, FontWeight,
    SharedFontData,
};
use serde::Serialize;
use std::collections::HashMap;

/// Result of obtaining one required font.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Shipped with the render engine; nothing to hand over.
    Bundled,
    Loaded(SharedFontData),
    Failed { kind: ErrorKind, message: String },
}

/// Per-job results of the resolving stage.
///
/// Holding the bytes here keeps a job's fonts alive even if a concurrent job
/// evicts them from the shared cache before assembly.
#[derive(Debug, Default, Clone)]
pub struct ResolvedFonts {
    by_key: HashMap<FontKey, Resolution>,
}

impl ResolvedFonts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FontKey, resolution: Resolution) {
        self.by_key.insert(key, resolution);
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// The recorded resolution of `requirement`. A requirement nothing was
    /// recorded for counts as not found.
    pub fn lookup(&self, requirement: &FontRequirement) -> Resolution {
        self.by_key
            .get(&requirement.key())
            .cloned()
            .unwrap_or_else(|| Resolution::Failed {
                kind: ErrorKind::NotFound,
                message: format!("{} was never resolved", requirement.key()),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFont {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub origin: FontOrigin,
    /// Zero for bundled fonts.
    pub size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFont {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub origin: FontOrigin,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-font results of a job, successes alongside failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontResolutionReport {
    pub primary: Option<String>,
    pub resolved: Vec<ResolvedFont>,
    pub failed: Vec<FailedFont>,
}

#[derive(Debug)]
pub struct Assembly {
    pub collection: FontCollection,
    pub report: FontResolutionReport,
}

/// Collects every successfully resolved requirement into a fresh collection.
///
/// Failed requirements are reported and left out. The job only fails when
/// the primary font is among them.
pub fn assemble(
    requirements: &[FontRequirement],
    primary: Option<&FontKey>,
    resolved: &ResolvedFonts,
) -> Result<Assembly, JobError> {
    let mut collection = FontCollection::new();
    let mut report = FontResolutionReport {
        primary: primary.map(|k| k.to_string()),
        ..FontResolutionReport::default()
    };
    let mut primary_failure = None;

    for requirement in requirements {
        let key = requirement.key();
        let size_bytes = match resolved.lookup(requirement) {
            Resolution::Bundled => 0,
            Resolution::Loaded(bytes) => {
                let size = bytes.len();
                collection.push(FontEntry::new(
                    requirement.family.clone(),
                    requirement.weight,
                    requirement.style,
                    bytes,
                ));
                size
            }
            Resolution::Failed { kind, message } => {
                if primary == Some(&key) {
                    primary_failure = Some((kind, message.clone()));
                }
                report.failed.push(FailedFont {
                    family: requirement.family.clone(),
                    weight: requirement.weight,
                    style: requirement.style,
                    origin: requirement.origin,
                    kind,
                    message,
                });
                continue;
            }
        };
        report.resolved.push(ResolvedFont {
            family: requirement.family.clone(),
            weight: requirement.weight,
            style: requirement.style,
            origin: requirement.origin,
            size_bytes,
        });
    }

    if let Some(primary) = primary {
        if !requirements.iter().any(|r| &r.key() == primary) {
            primary_failure = Some((ErrorKind::NotFound, "primary font is not a known requirement".into()));
        }
        if let Some((cause, message)) = primary_failure {
            let family = requirements
                .iter()
                .find(|r| &r.key() == primary)
                .map_or_else(|| primary.family().to_string(), |r| r.family.clone());
            return Err(JobError::FontResolutionFailed { family, cause, message });
        }
    }

    log::debug!(
        "Assembled {} font(s), {} failed",
        collection.len(),
        report.failed.len()
    );
    Ok(Assembly { collection, report })
}

use super::assembler::FontResolutionReport;
use super::progress::JobStage;
use crate::error::JobError;
use chrono::{DateTime, Utc};
use fontweave_types::{ConversionConfig, PageSize};

/// One conversion request. The id is generated by the caller and must be
/// unique among in-flight jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub id: String,
    pub document_source: String,
    pub config: ConversionConfig,
}

impl ConversionJob {
    pub fn new(id: impl Into<String>, document_source: impl Into<String>, config: ConversionConfig) -> Self {
        Self {
            id: id.into(),
            document_source: document_source.into(),
            config,
        }
    }

    /// Checks the request before any work is done.
    pub fn validate(&self, max_document_bytes: usize) -> Result<(), JobError> {
        if self.id.trim().is_empty() {
            return Err(JobError::Validation("job id must not be empty".into()));
        }
        if self.document_source.trim().is_empty() {
            return Err(JobError::Validation("document source is empty".into()));
        }
        if self.document_source.len() > max_document_bytes {
            return Err(JobError::Validation(format!(
                "document is {} bytes, the limit is {}",
                self.document_source.len(),
                max_document_bytes
            )));
        }
        if self.document_source.contains('\0') {
            return Err(JobError::Validation("document source contains NUL bytes".into()));
        }
        validate_config(&self.config)
    }
}

fn validate_config(config: &ConversionConfig) -> Result<(), JobError> {
    let (width, height) = config.page_size.dimensions_mm();
    if let PageSize::Custom { .. } = config.page_size {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(JobError::Validation(format!(
                "custom page size {}x{}mm is not positive",
                width, height
            )));
        }
    }
    if !config.margin_mm.is_finite() || config.margin_mm < 0.0 {
        return Err(JobError::Validation(format!("margin {}mm is invalid", config.margin_mm)));
    }
    if config.margin_mm * 2.0 >= width.min(height) {
        return Err(JobError::Validation(format!(
            "margin {}mm leaves no printable area on a {}x{}mm page",
            config.margin_mm, width, height
        )));
    }
    if config.default_font.as_deref().is_some_and(|f| f.trim().is_empty()) {
        return Err(JobError::Validation("default font must not be blank".into()));
    }
    Ok(())
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub pdf: Vec<u8>,
    pub fonts: FontResolutionReport,
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(ConversionOutput),
    Failed(JobError),
    /// A newer job claimed the slot; whatever this job produced was discarded.
    Superseded,
}

impl JobOutcome {
    pub fn stage(&self) -> JobStage {
        match self {
            JobOutcome::Succeeded(_) => JobStage::Succeeded,
            JobOutcome::Failed(_) => JobStage::Failed,
            JobOutcome::Superseded => JobStage::Superseded,
        }
    }

    pub fn output(&self) -> Option<&ConversionOutput> {
        match self {
            JobOutcome::Succeeded(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            JobOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// What a slot currently shows: the job occupying it, its stage and, once
/// settled, its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub job_id: String,
    pub stage: JobStage,
    pub outcome: Option<JobOutcome>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(source: &str, config: ConversionConfig) -> ConversionJob {
        ConversionJob::new("job-1", source, config)
    }

    #[test]
    fn accepts_a_plain_request() {
        assert!(job("<p>Hi</p>", ConversionConfig::default()).validate(1024).is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_documents() {
        let config = ConversionConfig::default();
        assert!(matches!(job("   ", config.clone()).validate(1024), Err(JobError::Validation(_))));
        assert!(matches!(job("abcdef", config.clone()).validate(4), Err(JobError::Validation(_))));
        assert!(matches!(
            ConversionJob::new("", "<p/>", config).validate(1024),
            Err(JobError::Validation(_))
        ));
    }

    #[test]
    fn rejects_impossible_page_geometry() {
        let tiny = ConversionConfig {
            page_size: PageSize::Custom {
                width_mm: 30.0,
                height_mm: 30.0,
            },
            margin_mm: 15.0,
            ..ConversionConfig::default()
        };
        assert!(job("<p/>", tiny).validate(1024).is_err());

        let negative = ConversionConfig {
            margin_mm: -1.0,
            ..ConversionConfig::default()
        };
        assert!(job("<p/>", negative).validate(1024).is_err());

        let zero = ConversionConfig {
            page_size: PageSize::Custom {
                width_mm: 0.0,
                height_mm: 100.0,
            },
            ..ConversionConfig::default()
        };
        assert!(job("<p/>", zero).validate(1024).is_err());
    }

    #[test]
    fn rejects_blank_default_font() {
        let config = ConversionConfig {
            default_font: Some("  ".into()),
            ..ConversionConfig::default()
        };
        assert!(job("<p/>", config).validate(1024).is_err());
    }
}

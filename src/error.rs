use fontweave_remote::ResolverBuildError;
use fontweave_resource::StoreError;
use fontweave_style::StyleParseError;
use fontweave_traits::{RenderError, StorageError};
use fontweave_types::ErrorKind;
use thiserror::Error;

/// Terminal failure of a conversion job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("Invalid conversion request: {0}")]
    Validation(String),

    #[error("Font detection failed: {0}")]
    Detection(#[from] StyleParseError),

    /// The document's primary font could not be obtained. `cause` is the tag
    /// of the per-font failure that caused it.
    #[error("Primary font '{family}' could not be resolved ({cause}): {message}")]
    FontResolutionFailed {
        family: String,
        cause: ErrorKind,
        message: String,
    },

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation(_) => ErrorKind::ValidationError,
            JobError::Detection(_) => ErrorKind::ParseError,
            JobError::FontResolutionFailed { .. } => ErrorKind::FontResolutionFailed,
            JobError::Render(_) => ErrorKind::RenderError,
        }
    }
}

/// Errors raised while assembling a pipeline from configuration.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Custom font storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Custom font store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolver(#[from] ResolverBuildError),
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag carried by every error that crosses a component boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkTimeout,
    NetworkError,
    ParseError,
    NotFound,
    QuotaExceeded,
    RetryExhausted,
    FontResolutionFailed,
    RenderError,
    ValidationError,
    /// Persistence failures of the custom font store that are not quota related.
    StorageError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkTimeout => "network_timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::RetryExhausted => "retry_exhausted",
            ErrorKind::FontResolutionFailed => "font_resolution_failed",
            ErrorKind::RenderError => "render_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::StorageError => "storage_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

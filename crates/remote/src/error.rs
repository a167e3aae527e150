use fontweave_retry::AttemptTimedOut;
use fontweave_traits::CodecError;
use fontweave_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontFetchError {
    #[error("Request to {target} timed out after {after_ms}ms")]
    NetworkTimeout { target: String, after_ms: u64 },

    #[error("Network error for {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Font family '{family}' not found (HTTP {status})")]
    NotFound { family: String, status: u16 },

    #[error("Giving up after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<FontFetchError> },
}

impl FontFetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FontFetchError::NetworkTimeout { .. } => ErrorKind::NetworkTimeout,
            FontFetchError::Network { .. } => ErrorKind::NetworkError,
            FontFetchError::Parse(_) => ErrorKind::ParseError,
            FontFetchError::NotFound { .. } => ErrorKind::NotFound,
            FontFetchError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
        }
    }

    /// Timeouts and network failures may succeed on another attempt;
    /// a missing family or an unparsable response will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, FontFetchError::NetworkTimeout { .. } | FontFetchError::Network { .. })
    }
}

impl From<AttemptTimedOut> for FontFetchError {
    fn from(err: AttemptTimedOut) -> Self {
        FontFetchError::NetworkTimeout {
            target: "font resolution attempt".to_string(),
            after_ms: err.after.as_millis() as u64,
        }
    }
}

impl From<CodecError> for FontFetchError {
    fn from(err: CodecError) -> Self {
        FontFetchError::Parse(err.to_string())
    }
}

/// Errors raised while constructing a [`RemoteFontResolver`](crate::RemoteFontResolver).
#[derive(Error, Debug)]
pub enum ResolverBuildError {
    #[error("Invalid stylesheet URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

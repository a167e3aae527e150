use async_trait::async_trait;
use fontweave_types::ContainerFormat;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported container format: {0}")]
    Unsupported(&'static str),

    #[error("Malformed {format} data: {message}")]
    Malformed { format: &'static str, message: String },
}

/// Decompresses font containers (WOFF, WOFF2) into raw SFNT outline data.
#[async_trait]
pub trait FontCodec: Send + Sync {
    async fn decompress(&self, format: ContainerFormat, bytes: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Returns a human-readable name for this codec (for logging/debugging).
    fn name(&self) -> &'static str;
}

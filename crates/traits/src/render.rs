use async_trait::async_trait;
use fontweave_types::{ConversionConfig, FontCollection};
use std::sync::Arc;
use thiserror::Error;

/// Leading bytes every successfully rendered document must start with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Structured failure reported by the render engine. Passed through untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    pub code: Option<String>,
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// The external engine that lays out and encodes the final document.
///
/// The collection is shared read-only; the engine must not expect to mutate it.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render(
        &self,
        source: &str,
        config: &ConversionConfig,
        fonts: Arc<FontCollection>,
    ) -> Result<Vec<u8>, RenderError>;

    /// Returns a human-readable name for this engine (for logging/debugging).
    fn name(&self) -> &'static str;
}

use crate::error::BuildError;
use fontweave_cache::FontCache;
use fontweave_remote::RemoteConfig;
use fontweave_resource::CustomFontStore;
use fontweave_retry::RetryConfig;
use fontweave_style::DEFAULT_BUNDLED_FONTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Process-wide settings of the font pipeline.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontweaveConfig {
    /// Item ceiling of the shared remote font cache.
    pub cache_capacity: usize,
    /// Byte quota of the custom font store.
    pub custom_font_quota_bytes: usize,
    /// Number of detection reports memoized by content hash.
    pub detection_cache_capacity: usize,
    pub remote: RemoteConfig,
    pub retry: RetryConfig,
    /// Families the render engine ships with; requirements on these are
    /// satisfied without any lookup.
    pub bundled_fonts: Vec<String>,
    /// Largest document source accepted by the validating stage.
    pub max_document_bytes: usize,
}

impl Default for FontweaveConfig {
    fn default() -> Self {
        Self {
            cache_capacity: FontCache::DEFAULT_CAPACITY,
            custom_font_quota_bytes: CustomFontStore::DEFAULT_MAX_BYTES,
            detection_cache_capacity: 32,
            remote: RemoteConfig::default(),
            retry: RetryConfig::default(),
            bundled_fonts: DEFAULT_BUNDLED_FONTS.iter().map(|f| f.to_string()).collect(),
            max_document_bytes: 10 * 1024 * 1024,
        }
    }
}

impl FontweaveConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        let config: FontweaveConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            BuildError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config from '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects settings no pipeline can run with.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.cache_capacity == 0 {
            return Err(BuildError::Config("cacheCapacity must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(BuildError::Config("retry.maxAttempts must be at least 1".into()));
        }
        if self.remote.max_concurrent_fetches == 0 {
            return Err(BuildError::Config("remote.maxConcurrentFetches must be at least 1".into()));
        }
        if self.max_document_bytes == 0 {
            return Err(BuildError::Config("maxDocumentBytes must be at least 1".into()));
        }
        Ok(())
    }
}

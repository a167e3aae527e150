use super::config::FontweaveConfig;
use super::orchestrator::ConversionOrchestrator;
use crate::error::BuildError;
use fontweave_cache::FontCache;
use fontweave_remote::RemoteFontResolver;
use fontweave_resource::{CustomFontStore, FilesystemFontStorage, InMemoryFontStorage};
use fontweave_retry::RetryConfig;
use fontweave_style::FontDetector;
use fontweave_traits::{FontCodec, FontStorage, RenderEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A builder for creating a [`ConversionOrchestrator`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: FontweaveConfig,
    storage: Option<Arc<dyn FontStorage>>,
    store_dir: Option<PathBuf>,
    renderer: Option<Arc<dyn RenderEngine>>,
    codec: Option<Arc<dyn FontCodec>>,
    cache: Option<Arc<FontCache>>,
}

impl PipelineBuilder {
    /// Creates a builder with the reference configuration, an in-memory
    /// custom font store and no render engine.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: FontweaveConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the whole configuration from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, BuildError> {
        self.config = FontweaveConfig::from_json_file(path)?;
        Ok(self)
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn with_custom_font_quota(mut self, max_bytes: usize) -> Self {
        self.config.custom_font_quota_bytes = max_bytes;
        self
    }

    pub fn with_stylesheet_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.stylesheet_url = url.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.remote.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.config.remote.max_concurrent_fetches = max;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Replaces the list of families the render engine ships with.
    pub fn with_bundled_fonts<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.bundled_fonts = families.into_iter().map(Into::into).collect();
        self
    }

    /// Persists custom fonts through `storage`.
    pub fn with_storage(mut self, storage: Arc<dyn FontStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Persists custom fonts as files under `dir`. Ignored if
    /// [`with_storage`](Self::with_storage) is also used.
    pub fn with_store_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.store_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RenderEngine>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Codec for compressed font containers; defaults to the builtin WOFF codec.
    pub fn with_codec(mut self, codec: Arc<dyn FontCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Shares an existing font cache instead of creating one.
    pub fn with_shared_cache(mut self, cache: Arc<FontCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Opens the custom font store and wires every component together.
    pub async fn build(self) -> Result<ConversionOrchestrator, BuildError> {
        let config = self.config;
        config.validate()?;

        let storage: Arc<dyn FontStorage> = match (self.storage, self.store_dir) {
            (Some(storage), _) => storage,
            (None, Some(dir)) => Arc::new(FilesystemFontStorage::new(dir).await?),
            (None, None) => Arc::new(InMemoryFontStorage::new()),
        };
        log::info!("Opening custom font store on {} storage", storage.name());
        let store = Arc::new(CustomFontStore::open(storage, config.custom_font_quota_bytes).await?);

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(FontCache::new(config.cache_capacity)));
        let mut resolver = RemoteFontResolver::new(&config.remote, config.retry, Arc::clone(&cache))?;
        if let Some(codec) = self.codec {
            resolver = resolver.with_codec(codec);
        }

        let detector = FontDetector::with_bundled_fonts(config.detection_cache_capacity, &config.bundled_fonts);

        Ok(ConversionOrchestrator::new(
            config,
            detector,
            store,
            cache,
            Arc::new(resolver),
            self.renderer,
        ))
    }
}

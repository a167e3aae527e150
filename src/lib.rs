//! Font resolution, caching and conversion orchestration for document
//! rendering.
//!
//! A conversion job moves through validation, font detection, font
//! resolution and rendering. Fonts come from the render engine's bundled
//! set, a quota-enforced custom font store, or a remote font-serving API
//! whose responses are kept in a bounded LRU cache.

pub mod error;
pub mod pipeline;

pub use error::{BuildError, JobError};
pub use pipeline::{
    Assembly, ConversionJob, ConversionOrchestrator, ConversionOutput, FontResolutionReport, FontweaveConfig,
    JobOutcome, JobStage, NoopListener, PipelineBuilder, ProgressEvent, ProgressListener, SlotView,
};

pub use fontweave_cache::{BoundedLruCache, CacheStats, FontCache};
pub use fontweave_remote::{BuiltinCodec, FontFetchError, RemoteConfig, RemoteFontResolver};
pub use fontweave_resource::{CustomFontStore, FilesystemFontStorage, StoreError, StoreStats};
pub use fontweave_retry::{RetryConfig, RetryError, RetryPolicy};
pub use fontweave_style::{DetectionReport, FontDetector};
pub use fontweave_traits::{CodecError, FontCodec, FontStorage, PDF_MAGIC, RenderEngine, RenderError};
pub use fontweave_types::{
    ConversionConfig, CustomFontRecord, ErrorKind, FontCollection, FontEntry, FontKey, FontOrigin, FontRequirement,
    FontStyle, FontWeight, PageSize,
};

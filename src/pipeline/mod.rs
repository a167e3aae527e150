//! Conversion job orchestration.
//!
//! - [`PipelineBuilder`]: fluent builder wiring store, cache, resolver and renderer
//! - [`ConversionOrchestrator`]: the per-slot job state machine
//! - [`assemble`]: turns per-font results into the collection the renderer receives
//! - [`ProgressListener`]: per-job observer of stage and font events
//!
//! # Example
//!
//! ```ignore
//! use fontweave::{ConversionJob, NoopListener, PipelineBuilder};
//! use std::sync::Arc;
//!
//! let orchestrator = PipelineBuilder::new()
//!     .with_store_dir("fonts")
//!     .with_renderer(Arc::new(MyEngine))
//!     .build()
//!     .await?;
//!
//! let job = ConversionJob::new("job-1", html, Default::default());
//! let outcome = orchestrator.convert("editor", job, Arc::new(NoopListener)).await;
//! ```

pub mod assembler;
mod builder;
pub mod config;
pub mod job;
mod orchestrator;
pub mod progress;

pub use assembler::{
    Assembly, FailedFont, FontResolutionReport, ResolvedFont, ResolvedFonts, Resolution, assemble,
};
pub use builder::PipelineBuilder;
pub use config::FontweaveConfig;
pub use job::{ConversionJob, ConversionOutput, JobOutcome, SlotView};
pub use orchestrator::ConversionOrchestrator;
pub use progress::{JobStage, NoopListener, ProgressEvent, ProgressListener};

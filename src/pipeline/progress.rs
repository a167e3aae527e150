//! Job stages and the per-job progress observer.

use fontweave_types::{ErrorKind, FontKey, FontOrigin};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of a conversion job. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Idle,
    Validating,
    DetectingFonts,
    ResolvingFonts,
    Rendering,
    Succeeded,
    Failed,
    Superseded,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Succeeded | JobStage::Failed | JobStage::Superseded)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: JobStage) -> bool {
        use JobStage::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Superseded) | (_, Failed) => true,
            (Idle, Validating)
            | (Validating, DetectingFonts)
            | (DetectingFonts, ResolvingFonts)
            | (ResolvingFonts, Rendering)
            | (Rendering, Succeeded) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStage::Idle => "idle",
            JobStage::Validating => "validating",
            JobStage::DetectingFonts => "detecting_fonts",
            JobStage::ResolvingFonts => "resolving_fonts",
            JobStage::Rendering => "rendering",
            JobStage::Succeeded => "succeeded",
            JobStage::Failed => "failed",
            JobStage::Superseded => "superseded",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observational notifications about a job. None of them influence the
/// job's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The job entered `stage`; emitted before the stage does any work.
    Stage { job_id: String, stage: JobStage },
    FontRetry {
        job_id: String,
        font: FontKey,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    FontResolved {
        job_id: String,
        font: FontKey,
        origin: FontOrigin,
    },
    FontFailed {
        job_id: String,
        font: FontKey,
        kind: ErrorKind,
        message: String,
    },
}

impl ProgressEvent {
    pub fn job_id(&self) -> &str {
        match self {
            ProgressEvent::Stage { job_id, .. }
            | ProgressEvent::FontRetry { job_id, .. }
            | ProgressEvent::FontResolved { job_id, .. }
            | ProgressEvent::FontFailed { job_id, .. } => job_id,
        }
    }
}

/// Receives the progress events of one job. Font events may arrive from
/// concurrent resolutions, so implementations must be thread-safe.
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Listener that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_event(&self, _event: &ProgressEvent) {}
}

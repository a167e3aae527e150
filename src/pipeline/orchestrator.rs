use super::assembler::{Assembly, ResolvedFonts, Resolution, assemble};
use super::config::FontweaveConfig;
use super::job::{ConversionJob, ConversionOutput, JobOutcome, SlotView};
use super::progress::{JobStage, ProgressEvent, ProgressListener};
use crate::error::JobError;
use chrono::{DateTime, Utc};
use fontweave_cache::FontCache;
use fontweave_remote::{FontFetchError, RemoteFontResolver};
use fontweave_resource::CustomFontStore;
use fontweave_retry::RetryNotice;
use fontweave_style::FontDetector;
use fontweave_traits::{PDF_MAGIC, RenderEngine, RenderError};
use fontweave_types::{
    ConversionConfig, ErrorKind, FontCollection, FontKey, FontOrigin, FontRequirement, FontStyle, FontWeight,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

struct Slot {
    job_id: String,
    generation: u64,
    stage: JobStage,
    outcome: Option<JobOutcome>,
    updated_at: DateTime<Utc>,
}

/// Identifies one running job inside the slot table.
struct Ticket {
    slot: String,
    job_id: String,
    generation: u64,
}

/// Why a job stopped before producing output.
enum Halt {
    Superseded,
    Failed(JobError),
}

impl From<JobError> for Halt {
    fn from(err: JobError) -> Self {
        Halt::Failed(err)
    }
}

/// Drives conversion jobs from validation to rendering.
///
/// Each slot holds at most one job. Starting a job on an occupied slot
/// supersedes the previous occupant: it keeps running until its current stage
/// settles, but it can no longer advance and its result is never published.
pub struct ConversionOrchestrator {
    config: FontweaveConfig,
    detector: FontDetector,
    store: Arc<CustomFontStore>,
    cache: Arc<FontCache>,
    resolver: Arc<RemoteFontResolver>,
    renderer: Option<Arc<dyn RenderEngine>>,
    slots: Mutex<HashMap<String, Slot>>,
    next_generation: AtomicU64,
}

impl ConversionOrchestrator {
    pub(crate) fn new(
        config: FontweaveConfig,
        detector: FontDetector,
        store: Arc<CustomFontStore>,
        cache: Arc<FontCache>,
        resolver: Arc<RemoteFontResolver>,
        renderer: Option<Arc<dyn RenderEngine>>,
    ) -> Self {
        Self {
            config,
            detector,
            store,
            cache,
            resolver,
            renderer,
            slots: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &FontweaveConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CustomFontStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<FontCache> {
        &self.cache
    }

    pub fn detector(&self) -> &FontDetector {
        &self.detector
    }

    /// Runs `job` in `slot` to completion and returns how it ended.
    ///
    /// The slot's visible result is only updated if the job is still the
    /// slot's occupant when it settles.
    pub async fn convert(&self, slot: &str, job: ConversionJob, listener: Arc<dyn ProgressListener>) -> JobOutcome {
        let ticket = self.claim(slot, &job.id);
        let result = self.run(&ticket, &job, &listener).await;
        self.settle(&ticket, result, listener.as_ref())
    }

    /// What `slot` currently shows, if anything.
    pub fn slot(&self, slot: &str) -> Option<SlotView> {
        self.slots().get(slot).map(|s| SlotView {
            job_id: s.job_id.clone(),
            stage: s.stage,
            outcome: s.outcome.clone(),
            updated_at: s.updated_at,
        })
    }

    /// Discards the slot's state. A job still running there is superseded.
    pub fn reset(&self, slot: &str) -> bool {
        let removed = self.slots().remove(slot);
        if let Some(previous) = &removed {
            info!("Slot '{}' reset (job '{}' was {})", slot, previous.job_id, previous.stage);
        }
        removed.is_some()
    }

    /// Detects and resolves the fonts of a document without running a job:
    /// no slot is claimed and nothing is rendered.
    pub async fn prepare_fonts(
        &self,
        job_id: &str,
        document: &str,
        config: &ConversionConfig,
        listener: Arc<dyn ProgressListener>,
    ) -> Result<Assembly, JobError> {
        let (requirements, primary) = self.detect(document, config)?;
        let resolved = self.resolve(job_id, &requirements, &listener).await;
        assemble(&requirements, primary.as_ref(), &resolved)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn claim(&self, slot: &str, job_id: &str) -> Ticket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots();
        if let Some(previous) = slots.get(slot) {
            if !previous.stage.is_terminal() {
                info!(
                    "Job '{}' supersedes job '{}' in slot '{}' (was {})",
                    job_id, previous.job_id, slot, previous.stage
                );
            }
        }
        slots.insert(
            slot.to_string(),
            Slot {
                job_id: job_id.to_string(),
                generation,
                stage: JobStage::Idle,
                outcome: None,
                updated_at: Utc::now(),
            },
        );
        Ticket {
            slot: slot.to_string(),
            job_id: job_id.to_string(),
            generation,
        }
    }

    /// Moves the job to `stage` and announces it, unless it lost its slot.
    fn enter(&self, ticket: &Ticket, stage: JobStage, listener: &dyn ProgressListener) -> Result<(), Halt> {
        {
            let mut slots = self.slots();
            let slot = slots
                .get_mut(&ticket.slot)
                .filter(|s| s.generation == ticket.generation)
                .ok_or(Halt::Superseded)?;
            if !slot.stage.can_advance_to(stage) {
                warn!("Job '{}' cannot move from {} to {}", ticket.job_id, slot.stage, stage);
                return Err(Halt::Superseded);
            }
            slot.stage = stage;
            slot.updated_at = Utc::now();
        }
        info!("Job '{}': {}", ticket.job_id, stage);
        listener.on_event(&ProgressEvent::Stage {
            job_id: ticket.job_id.clone(),
            stage,
        });
        Ok(())
    }

    async fn run(
        &self,
        ticket: &Ticket,
        job: &ConversionJob,
        listener: &Arc<dyn ProgressListener>,
    ) -> Result<ConversionOutput, Halt> {
        self.enter(ticket, JobStage::Validating, listener.as_ref())?;
        job.validate(self.config.max_document_bytes)?;

        self.enter(ticket, JobStage::DetectingFonts, listener.as_ref())?;
        let (requirements, primary) = self.detect(&job.document_source, &job.config)?;

        self.enter(ticket, JobStage::ResolvingFonts, listener.as_ref())?;
        let resolved = self.resolve(&job.id, &requirements, listener).await;
        let assembly = assemble(&requirements, primary.as_ref(), &resolved)?;

        self.enter(ticket, JobStage::Rendering, listener.as_ref())?;
        let pdf = self.render(job, assembly.collection).await?;

        Ok(ConversionOutput {
            pdf,
            fonts: assembly.report,
        })
    }

    fn settle(&self, ticket: &Ticket, result: Result<ConversionOutput, Halt>, listener: &dyn ProgressListener) -> JobOutcome {
        let outcome = match result {
            Ok(output) => JobOutcome::Succeeded(output),
            Err(Halt::Failed(err)) => JobOutcome::Failed(err),
            Err(Halt::Superseded) => JobOutcome::Superseded,
        };

        let published = outcome != JobOutcome::Superseded && {
            let mut slots = self.slots();
            match slots.get_mut(&ticket.slot).filter(|s| s.generation == ticket.generation) {
                Some(slot) => {
                    slot.stage = outcome.stage();
                    slot.outcome = Some(outcome.clone());
                    slot.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };

        let outcome = if published { outcome } else { JobOutcome::Superseded };
        match &outcome {
            JobOutcome::Failed(err) => warn!("Job '{}' failed [{}]: {}", ticket.job_id, err.kind(), err),
            JobOutcome::Superseded => info!("Job '{}' was superseded; its result is discarded", ticket.job_id),
            JobOutcome::Succeeded(output) => info!("Job '{}' succeeded ({} bytes)", ticket.job_id, output.pdf.len()),
        }
        listener.on_event(&ProgressEvent::Stage {
            job_id: ticket.job_id.clone(),
            stage: outcome.stage(),
        });
        outcome
    }

    fn classify(&self, family: &str) -> FontOrigin {
        if self.store.has_family(family) {
            FontOrigin::Custom
        } else if self.detector.is_bundled(family) {
            FontOrigin::System
        } else {
            FontOrigin::Remote
        }
    }

    /// Requirements of the document plus its primary font. An explicit
    /// default font replaces the detected primary and is always required.
    fn detect(
        &self,
        document: &str,
        config: &ConversionConfig,
    ) -> Result<(Vec<FontRequirement>, Option<FontKey>), JobError> {
        let families = self.store.families();
        let report = self.detector.detect(document, &families, false)?;
        let mut requirements = report.requirements.clone();

        let primary = match config.default_font.as_deref() {
            Some(family) => {
                let requirement =
                    FontRequirement::new(family, FontWeight::REGULAR, FontStyle::Normal, self.classify(family));
                let key = requirement.key();
                if report.find(&key).is_none() {
                    requirements.push(requirement);
                }
                Some(key)
            }
            None => report.primary.clone(),
        };

        debug!(
            "Detected {} requirement(s), primary {:?}",
            requirements.len(),
            primary.as_ref().map(|k| k.to_string())
        );
        Ok((requirements, primary))
    }

    /// Resolves every requirement. Remote fonts are fetched concurrently, at
    /// most `max_concurrent_fetches` at a time; the call returns only once all
    /// of them have settled.
    async fn resolve(
        &self,
        job_id: &str,
        requirements: &[FontRequirement],
        listener: &Arc<dyn ProgressListener>,
    ) -> ResolvedFonts {
        let mut resolved = ResolvedFonts::new();
        let limit = Arc::new(Semaphore::new(self.config.remote.max_concurrent_fetches.max(1)));
        let mut fetches = JoinSet::new();

        for requirement in requirements {
            let key = requirement.key();
            match requirement.origin {
                FontOrigin::System => {
                    self.record(job_id, key, FontOrigin::System, Resolution::Bundled, &mut resolved, listener.as_ref());
                }
                FontOrigin::Custom => {
                    let resolution = match self.store.best_match(&key) {
                        Some((record, bytes)) => {
                            debug!("Custom font '{}' satisfies {}", record.id, key);
                            Resolution::Loaded(bytes)
                        }
                        None => Resolution::Failed {
                            kind: ErrorKind::NotFound,
                            message: format!("no custom font record for '{}'", requirement.family),
                        },
                    };
                    self.record(job_id, key, FontOrigin::Custom, resolution, &mut resolved, listener.as_ref());
                }
                FontOrigin::Remote => {
                    let resolver = Arc::clone(&self.resolver);
                    let listener = Arc::clone(listener);
                    let limit = Arc::clone(&limit);
                    let requirement = requirement.clone();
                    let job_id = job_id.to_string();
                    fetches.spawn(async move {
                        let _permit = limit.acquire_owned().await.ok();
                        let result = resolver
                            .resolve_with(&requirement, |notice: &RetryNotice<'_, FontFetchError>| {
                                listener.on_event(&ProgressEvent::FontRetry {
                                    job_id: job_id.clone(),
                                    font: key.clone(),
                                    attempt: notice.attempt,
                                    delay: notice.delay,
                                    error: notice.error.to_string(),
                                })
                            })
                            .await;
                        (requirement.key(), result)
                    });
                }
            }
        }

        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((key, Ok(bytes))) => {
                    self.record(job_id, key, FontOrigin::Remote, Resolution::Loaded(bytes), &mut resolved, listener.as_ref());
                }
                Ok((key, Err(err))) => {
                    let resolution = Resolution::Failed {
                        kind: err.kind(),
                        message: err.to_string(),
                    };
                    self.record(job_id, key, FontOrigin::Remote, resolution, &mut resolved, listener.as_ref());
                }
                // Requirements without a recorded resolution fail at assembly.
                Err(e) => warn!("Font resolution task for job '{}' aborted: {}", job_id, e),
            }
        }
        debug!("Job '{}' settled {} of {} font(s)", job_id, resolved.len(), requirements.len());
        resolved
    }

    fn record(
        &self,
        job_id: &str,
        key: FontKey,
        origin: FontOrigin,
        resolution: Resolution,
        resolved: &mut ResolvedFonts,
        listener: &dyn ProgressListener,
    ) {
        let event = match &resolution {
            Resolution::Failed { kind, message } => {
                warn!("Could not resolve {} [{}]: {}", key, kind, message);
                ProgressEvent::FontFailed {
                    job_id: job_id.to_string(),
                    font: key.clone(),
                    kind: *kind,
                    message: message.clone(),
                }
            }
            _ => ProgressEvent::FontResolved {
                job_id: job_id.to_string(),
                font: key.clone(),
                origin,
            },
        };
        listener.on_event(&event);
        resolved.insert(key, resolution);
    }

    async fn render(&self, job: &ConversionJob, collection: FontCollection) -> Result<Vec<u8>, JobError> {
        let engine = self
            .renderer
            .as_ref()
            .ok_or_else(|| RenderError::new("no render engine configured").with_code("no_engine"))?;
        debug!("Rendering job '{}' with {} ({} fonts)", job.id, engine.name(), collection.len());

        let pdf = engine
            .render(&job.document_source, &job.config, Arc::new(collection))
            .await?;
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(RenderError::new(format!(
                "{} returned {} bytes without a PDF header",
                engine.name(),
                pdf.len()
            ))
            .with_code("invalid_output")
            .into());
        }
        Ok(pdf)
    }
}

impl std::fmt::Debug for ConversionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionOrchestrator")
            .field("store", &self.store)
            .field("cache", &self.cache.stats())
            .field("resolver", &self.resolver)
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .field("slots", &self.slots().len())
            .finish()
    }
}

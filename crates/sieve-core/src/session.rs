//! Review session: the entry points behind keep, discard and modify.
//!
//! A session owns the review queue and the live settings. Every accepting
//! decision captures the effect settings and base output directory as they
//! are at that moment, hands one commit job to the dispatcher and advances
//! the queue without waiting for it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::archive::ArchiveCoordinator;
use crate::config::Config;
use crate::dispatch::{JobId, JobOutcome, TaskDispatcher};
use crate::error::{PipelineError, PipelineResult, Result};
use crate::pipeline::{FileDiscovery, ImageDecoder, ImageInfo, ImageProcessor};
use crate::review::{Decided, ReviewQueue, ReviewState};
use crate::types::{Decision, MAX_QUALITY, MIN_QUALITY};

/// What a decision did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionReceipt {
    pub decided: Decided,
    /// Commit job, `None` for discard
    pub job: Option<JobId>,
    /// Base output directory captured for the job
    pub base_dir: Option<PathBuf>,
}

/// Queue, settings and background commits for one interactive review.
pub struct ReviewSession {
    config: Config,
    queue: ReviewQueue,
    decoder: ImageDecoder,
    coordinator: Arc<ArchiveCoordinator>,
    dispatcher: TaskDispatcher,
}

impl ReviewSession {
    /// Build a session whose jobs run on `runtime`.
    ///
    /// Returns the receiver for job outcomes alongside the session.
    pub fn new(config: Config, runtime: Handle) -> (Self, UnboundedReceiver<JobOutcome>) {
        let coordinator = ArchiveCoordinator::new(ImageProcessor::new(&config));
        Self::with_coordinator(config, runtime, coordinator)
    }

    pub fn with_coordinator(
        config: Config,
        runtime: Handle,
        coordinator: ArchiveCoordinator,
    ) -> (Self, UnboundedReceiver<JobOutcome>) {
        let (dispatcher, outcomes) =
            TaskDispatcher::new(runtime, config.processing.parallel_workers);
        let session = Self {
            queue: ReviewQueue::new(FileDiscovery::new(config.processing.clone())),
            decoder: ImageDecoder::new(config.limits.clone()),
            coordinator: Arc::new(coordinator),
            dispatcher,
            config,
        };
        (session, outcomes)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Live settings. Changes apply to decisions made afterwards.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    pub fn state(&self) -> ReviewState {
        self.queue.state()
    }

    pub fn current(&self) -> Option<&Path> {
        self.queue.current()
    }

    /// Load `folder` for review. On error the current review is untouched.
    pub fn load_folder(&mut self, folder: &Path) -> PipelineResult<usize> {
        self.queue.load_folder(folder)
    }

    /// Format and dimensions of the current candidate.
    pub fn probe_current(&self) -> Option<PipelineResult<ImageInfo>> {
        self.queue.current().map(|path| self.decoder.probe(path))
    }

    /// Step past the current candidate without deciding.
    pub fn skip_current(&mut self) -> Option<PathBuf> {
        let skipped = self.queue.skip_current();
        if let Some(path) = &skipped {
            tracing::warn!("Skipping unreadable candidate {:?}", path);
        }
        skipped
    }

    /// Where an accepting decision made now would write.
    pub fn resolve_base_dir(&self) -> Option<PathBuf> {
        self.config.output.resolve_base_dir(self.queue.folder())
    }

    pub fn keep(&mut self) -> Result<Option<DecisionReceipt>> {
        self.decide(Decision::Keep)
    }

    pub fn discard(&mut self) -> Result<Option<DecisionReceipt>> {
        self.decide(Decision::Discard)
    }

    pub fn modify(&mut self) -> Result<Option<DecisionReceipt>> {
        self.decide(Decision::Modify)
    }

    /// Apply `decision` to the current candidate.
    ///
    /// Returns `Ok(None)` when there is no current candidate. If the commit
    /// job cannot be submitted the cursor stays where it is.
    pub fn decide(&mut self, decision: Decision) -> Result<Option<DecisionReceipt>> {
        let Some(source) = self.queue.current().map(Path::to_path_buf) else {
            return Ok(None);
        };

        let (job, base_dir) = match decision.category() {
            None => (None, None),
            Some(category) => {
                let effects = self.config.effects.snapshot();
                let base_dir = self
                    .resolve_base_dir()
                    .ok_or_else(|| PipelineError::NoOutputDirectory(source.clone()))?;

                let coordinator = Arc::clone(&self.coordinator);
                let job_source = source.clone();
                let job_base = base_dir.clone();
                let id = self.dispatcher.submit(source.clone(), move || {
                    let mut rng = rand::thread_rng();
                    coordinator.commit(&job_source, &job_base, category, &effects, &mut rng)
                })?;
                (Some(id), Some(base_dir))
            }
        };

        let Some(decided) = self.queue.decide(decision) else {
            return Ok(None);
        };
        tracing::info!("{:?}: {:?}", decision, decided.path);
        Ok(Some(DecisionReceipt {
            decided,
            job,
            base_dir,
        }))
    }

    /// Raise or lower JPEG quality by `delta`, clamped to the valid range.
    pub fn adjust_quality(&mut self, delta: i16) -> u8 {
        let quality = (self.config.effects.jpeg_quality as i16 + delta)
            .clamp(MIN_QUALITY as i16, MAX_QUALITY as i16) as u8;
        self.config.effects.jpeg_quality = quality;
        quality
    }

    pub fn toggle_realism(&mut self) -> bool {
        let effects = &mut self.config.effects;
        effects.apply_realism_effects = !effects.apply_realism_effects;
        effects.apply_realism_effects
    }

    pub fn toggle_central_folder(&mut self) -> bool {
        let output = &mut self.config.output;
        output.use_central_folder = !output.use_central_folder;
        output.use_central_folder
    }

    /// Set and enable the central output folder.
    pub fn set_central_folder(&mut self, path: impl Into<String>) {
        self.config.output.central_folder_path = path.into();
        self.config.output.use_central_folder = true;
    }

    /// Commits submitted but not yet finished.
    pub fn pending(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Stop taking decisions and wait for every submitted commit.
    pub async fn shutdown(&self) -> usize {
        self.dispatcher.shutdown().await
    }
}

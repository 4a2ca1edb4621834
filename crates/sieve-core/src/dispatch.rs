//! Bounded worker pool for pipeline jobs, decoupled from the review thread.
//!
//! `submit` only spawns a task and returns. Each task waits for one of
//! `workers` permits, runs its job on tokio's blocking pool, logs the result
//! and sends a [`JobOutcome`] on the outcome channel. `shutdown` closes the
//! door to new work and waits for everything already submitted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{DispatchError, JobError, PipelineResult};
use crate::types::Committed;

/// Identifier handed out per submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of one job, delivered on the outcome channel.
#[derive(Debug)]
pub struct JobOutcome<T = Committed> {
    pub id: JobId,
    pub source: PathBuf,
    pub result: Result<T, JobError>,
}

impl<T> JobOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

struct Inflight {
    accepting: bool,
    handles: Vec<JoinHandle<()>>,
}

/// Runs jobs on at most `workers` threads at a time.
pub struct TaskDispatcher<T = Committed> {
    runtime: Handle,
    permits: Arc<Semaphore>,
    workers: usize,
    next_id: AtomicU64,
    pending: Arc<AtomicUsize>,
    inflight: Mutex<Inflight>,
    outcomes: mpsc::UnboundedSender<JobOutcome<T>>,
}

impl<T: Send + 'static> TaskDispatcher<T> {
    /// Create a dispatcher on `runtime` and the receiving end of its outcomes.
    pub fn new(runtime: Handle, workers: usize) -> (Self, mpsc::UnboundedReceiver<JobOutcome<T>>) {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            runtime,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            next_id: AtomicU64::new(1),
            pending: Arc::new(AtomicUsize::new(0)),
            inflight: Mutex::new(Inflight {
                accepting: true,
                handles: Vec::new(),
            }),
            outcomes: tx,
        };
        (dispatcher, rx)
    }

    /// Queue `job` for `source`. Never blocks on the job itself.
    pub fn submit<F>(&self, source: impl Into<PathBuf>, job: F) -> Result<JobId, DispatchError>
    where
        F: FnOnce() -> PipelineResult<T> + Send + 'static,
    {
        let source = source.into();
        let mut inflight = self.lock();
        if !inflight.accepting {
            tracing::warn!("Rejected job for {:?}: dispatcher is shutting down", source);
            return Err(DispatchError::ShuttingDown(source));
        }

        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pending.fetch_add(1, Ordering::SeqCst);

        let permits = self.permits.clone();
        let pending = self.pending.clone();
        let outcomes = self.outcomes.clone();
        let task_source = source.clone();

        let handle = self.runtime.spawn(async move {
            let permit = permits.acquire_owned().await.ok();
            let result = match tokio::task::spawn_blocking(job).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(JobError::Pipeline(e)),
                Err(e) => Err(JobError::Panicked(e.to_string())),
            };
            drop(permit);

            match &result {
                Ok(_) => tracing::debug!("Job {} finished: {:?}", id, task_source),
                Err(e) => tracing::error!("Job {} failed for {:?}: {}", id, task_source, e),
            }

            pending.fetch_sub(1, Ordering::SeqCst);
            // Receiver may be gone; the outcome has been logged either way.
            let _ = outcomes.send(JobOutcome {
                id,
                source: task_source,
                result,
            });
        });

        inflight.handles.retain(|h| !h.is_finished());
        inflight.handles.push(handle);
        tracing::debug!("Submitted job {} for {:?}", id, source);
        Ok(id)
    }

    /// Jobs submitted but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_accepting(&self) -> bool {
        self.lock().accepting
    }

    /// Stop accepting work and wait for every submitted job to finish.
    ///
    /// Returns the number of jobs that were still tracked when called.
    pub async fn shutdown(&self) -> usize {
        let handles = {
            let mut inflight = self.lock();
            inflight.accepting = false;
            std::mem::take(&mut inflight.handles)
        };

        let count = handles.len();
        tracing::info!("Draining {} outstanding jobs", self.pending());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Dispatcher task aborted: {}", e);
            }
        }
        tracing::debug!("Dispatcher drained");
        count
    }

    fn lock(&self) -> MutexGuard<'_, Inflight> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

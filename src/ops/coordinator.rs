use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::progress::{spawn_stepper, ProgressReporter, SyntheticProgress};
use super::types::{OperationEvent, OperationSnapshot, OperationStatus};
use crate::error::OperationError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The mutable record one coordinator owns. All transitions go through the
/// coordinator's methods; `run_seq` identifies the current run so late
/// reports and settlements from an older run are discarded.
pub(crate) struct Record {
    pub(crate) run_seq: u64,
    pub(crate) run_id: Option<Uuid>,
    pub(crate) status: OperationStatus,
    pub(crate) progress: u8,
    pub(crate) error: Option<String>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) observer: Option<Arc<dyn Fn(u8) + Send + Sync>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) settled: CancellationToken,
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<Record>,
    pub(crate) events: broadcast::Sender<OperationEvent>,
}

impl Shared {
    pub(crate) fn emit(&self, event: OperationEvent) {
        let _ = self.events.send(event);
    }
}

/// Tracks the lifecycle of one logical asynchronous task.
///
/// A coordinator owns its record exclusively: status, progress, result and
/// error only change through `start`, `cancel` and `reset`. At most one run
/// is in flight at a time; a second `start` is rejected immediately with
/// `AlreadyRunning`. Instances are independent, one per logical task.
///
/// Cancellation is cooperative. The spawned work is never interrupted; once
/// a run is cancelled, whatever the work eventually produces is discarded
/// without touching the record.
pub struct OperationCoordinator<T> {
    shared: Arc<Shared>,
    result: Arc<Mutex<Option<T>>>,
    synthetic: Option<SyntheticProgress>,
}

impl<T> Clone for OperationCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            result: self.result.clone(),
            synthetic: self.synthetic,
        }
    }
}

impl<T> Default for OperationCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OperationCoordinator<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Coordinator that simulates progress while the work runs, for backends
    /// that expose no progress signal.
    pub fn with_synthetic_progress(config: SyntheticProgress) -> Self {
        Self::build(Some(config))
    }

    fn build(synthetic: Option<SyntheticProgress>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Record {
                    run_seq: 0,
                    run_id: None,
                    status: OperationStatus::Idle,
                    progress: 0,
                    error: None,
                    started_at: None,
                    ended_at: None,
                    observer: None,
                    cancel: CancellationToken::new(),
                    settled: CancellationToken::new(),
                }),
                events,
            }),
            result: Arc::new(Mutex::new(None)),
            synthetic,
        }
    }

    /// Request cooperative cancellation of the current run.
    ///
    /// Marks the run `Cancelled` immediately; the in-flight caller of
    /// `start` sees `OperationError::Cancelled`. Returns false when nothing
    /// is running.
    pub fn cancel(&self) -> bool {
        let mut record = self.shared.state.lock();
        if record.status != OperationStatus::Running {
            return false;
        }
        record.status = OperationStatus::Cancelled;
        record.ended_at = Some(Utc::now());
        record.cancel.cancel();
        record.settled.cancel();
        let run_id = record.run_id;
        let progress = record.progress;
        drop(record);

        if let Some(run_id) = run_id {
            log::info!("operation run {} cancelled", run_id);
            self.shared.emit(OperationEvent {
                run_id,
                status: OperationStatus::Cancelled,
                progress,
            });
        }
        true
    }

    /// Clear a terminal record back to `Idle`.
    ///
    /// Rejected with `InvalidState` while a run is in flight; a no-op when
    /// already idle.
    pub fn reset(&self) -> Result<(), OperationError> {
        let mut record = self.shared.state.lock();
        match record.status {
            OperationStatus::Running => Err(OperationError::InvalidState(
                "cannot reset while an operation is running".to_string(),
            )),
            OperationStatus::Idle => Ok(()),
            _ => {
                record.status = OperationStatus::Idle;
                record.progress = 0;
                record.error = None;
                record.run_id = None;
                record.started_at = None;
                record.ended_at = None;
                record.observer = None;
                *self.result.lock() = None;
                Ok(())
            }
        }
    }

    pub fn snapshot(&self) -> OperationSnapshot {
        let record = self.shared.state.lock();
        OperationSnapshot {
            run_id: record.run_id,
            status: record.status,
            progress: record.progress,
            error: record.error.clone(),
            started_at: record.started_at,
            ended_at: record.ended_at,
        }
    }

    pub fn status(&self) -> OperationStatus {
        self.shared.state.lock().status
    }

    pub fn progress(&self) -> u8 {
        self.shared.state.lock().progress
    }

    pub fn is_running(&self) -> bool {
        self.status().is_active()
    }

    /// Error message of the last failed run, for presentation.
    pub fn error_message(&self) -> Option<String> {
        self.shared.state.lock().error.clone()
    }

    /// Subscribe to transition and progress notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.shared.events.subscribe()
    }
}

impl<T: Clone + Send + 'static> OperationCoordinator<T> {
    /// Run `work` under lifecycle tracking.
    ///
    /// `work` receives a `ProgressReporter` and is spawned on the runtime;
    /// its result is returned on success and its error re-raised verbatim
    /// on failure.
    pub async fn start<F, Fut>(&self, work: F) -> Result<T, OperationError>
    where
        F: FnOnce(ProgressReporter) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.run(work, None, None).await
    }

    /// Like `start`, with a per-invocation progress observer.
    pub async fn start_with_progress<F, Fut, P>(
        &self,
        work: F,
        on_progress: P,
    ) -> Result<T, OperationError>
    where
        F: FnOnce(ProgressReporter) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        P: Fn(u8) + Send + Sync + 'static,
    {
        self.run(work, Some(Arc::new(on_progress)), None).await
    }

    /// Like `start`, but the run is cancelled if it outlives `deadline`.
    pub async fn start_with_deadline<F, Fut>(
        &self,
        work: F,
        deadline: Duration,
    ) -> Result<T, OperationError>
    where
        F: FnOnce(ProgressReporter) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.run(work, None, Some(deadline)).await
    }

    async fn run<F, Fut>(
        &self,
        work: F,
        observer: Option<Arc<dyn Fn(u8) + Send + Sync>>,
        deadline: Option<Duration>,
    ) -> Result<T, OperationError>
    where
        F: FnOnce(ProgressReporter) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (run, run_id, cancel, settled) = {
            let mut record = self.shared.state.lock();
            if record.status == OperationStatus::Running {
                return Err(OperationError::AlreadyRunning);
            }
            record.run_seq += 1;
            let run_id = Uuid::new_v4();
            record.run_id = Some(run_id);
            record.status = OperationStatus::Running;
            record.progress = 0;
            record.error = None;
            record.started_at = Some(Utc::now());
            record.ended_at = None;
            record.observer = observer;
            record.cancel = CancellationToken::new();
            record.settled = CancellationToken::new();
            *self.result.lock() = None;
            (
                record.run_seq,
                run_id,
                record.cancel.clone(),
                record.settled.clone(),
            )
        };

        log::debug!("operation run {} started", run_id);
        self.shared.emit(OperationEvent {
            run_id,
            status: OperationStatus::Running,
            progress: 0,
        });

        if let Some(config) = self.synthetic {
            spawn_stepper(self.shared.clone(), run, config, settled.clone());
        }

        let reporter = ProgressReporter {
            shared: self.shared.clone(),
            run,
        };
        let mut handle = tokio::spawn(work(reporter));

        let deadline_expired = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline_expired);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OperationError::Cancelled),
            _ = &mut deadline_expired => {
                self.cancel();
                Err(OperationError::Cancelled)
            }
            joined = &mut handle => match joined {
                Ok(Ok(value)) => self.commit_success(run, value),
                Ok(Err(err)) => Err(self.commit_failure(run, err)),
                Err(join_err) => Err(self.commit_failure(
                    run,
                    anyhow::anyhow!("worker task failed: {join_err}"),
                )),
            },
        }
    }

    fn commit_success(&self, run: u64, value: T) -> Result<T, OperationError> {
        let mut record = self.shared.state.lock();
        if record.run_seq != run || record.status != OperationStatus::Running {
            // the run was cancelled while the work settled
            return Err(OperationError::Cancelled);
        }
        record.status = OperationStatus::Succeeded;
        let moved = record.progress != 100;
        record.progress = 100;
        record.ended_at = Some(Utc::now());
        record.settled.cancel();
        let run_id = record.run_id;
        let observer = record.observer.clone();
        *self.result.lock() = Some(value.clone());
        drop(record);

        if moved {
            if let Some(callback) = observer {
                callback(100);
            }
        }
        if let Some(run_id) = run_id {
            log::debug!("operation run {} succeeded", run_id);
            self.shared.emit(OperationEvent {
                run_id,
                status: OperationStatus::Succeeded,
                progress: 100,
            });
        }
        Ok(value)
    }

    fn commit_failure(&self, run: u64, err: anyhow::Error) -> OperationError {
        let mut record = self.shared.state.lock();
        if record.run_seq != run || record.status != OperationStatus::Running {
            return OperationError::Cancelled;
        }
        record.status = OperationStatus::Failed;
        record.error = Some(err.to_string());
        record.ended_at = Some(Utc::now());
        record.settled.cancel();
        let run_id = record.run_id;
        let progress = record.progress;
        drop(record);

        if let Some(run_id) = run_id {
            log::debug!("operation run {} failed: {}", run_id, err);
            self.shared.emit(OperationEvent {
                run_id,
                status: OperationStatus::Failed,
                progress,
            });
        }
        OperationError::Work(err)
    }

    /// Result of the last successful run, retained until the next `start`
    /// or `reset`.
    pub fn result(&self) -> Option<T> {
        self.result.lock().as_ref().cloned()
    }
}

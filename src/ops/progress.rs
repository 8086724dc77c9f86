// Progress reporting: the handle given to in-flight work, and the
// fixed-interval stepper used when the work has no progress signal of its own

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::coordinator::Shared;
use super::types::{OperationEvent, OperationStatus};

/// Fixed-interval stepper policy for work that reports no progress itself.
///
/// Each tick adds `step` percentage points up to `ceiling`. The ceiling is
/// kept strictly below 100 so simulated motion can never look like
/// completion; the stepper stops the moment the run settles.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticProgress {
    /// Interval between increments.
    pub interval: Duration,
    /// Percentage points added per tick.
    pub step: u8,
    /// Highest simulated percentage, clamped to 99 at runtime.
    pub ceiling: u8,
}

impl Default for SyntheticProgress {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(300),
            step: 5,
            ceiling: 95,
        }
    }
}

/// Handle the in-flight work uses to report completion percentage.
///
/// Reports are clamped to [0, 100] and never decrease within a run. A
/// reporter belonging to a settled or superseded run is inert.
#[derive(Clone)]
pub struct ProgressReporter {
    pub(crate) shared: Arc<Shared>,
    pub(crate) run: u64,
}

impl ProgressReporter {
    pub fn report(&self, pct: u8) {
        let mut record = self.shared.state.lock();
        if record.run_seq != self.run || record.status != OperationStatus::Running {
            return;
        }
        let next = pct.min(100);
        if next <= record.progress {
            return;
        }
        record.progress = next;
        let run_id = match record.run_id {
            Some(id) => id,
            None => return,
        };
        let observer = record.observer.clone();
        drop(record);

        if let Some(callback) = observer {
            callback(next);
        }
        self.shared.emit(OperationEvent {
            run_id,
            status: OperationStatus::Running,
            progress: next,
        });
    }
}

/// Drive simulated progress for one run until it settles or hits the ceiling.
pub(crate) fn spawn_stepper(
    shared: Arc<Shared>,
    run: u64,
    config: SyntheticProgress,
    settled: CancellationToken,
) {
    tokio::spawn(async move {
        let ceiling = config.ceiling.min(99);
        let step = config.step.max(1);
        loop {
            tokio::select! {
                _ = settled.cancelled() => break,
                _ = tokio::time::sleep(config.interval) => {}
            }

            let mut record = shared.state.lock();
            if record.run_seq != run || record.status != OperationStatus::Running {
                break;
            }
            if record.progress >= ceiling {
                break;
            }
            let next = record.progress.saturating_add(step).min(ceiling);
            record.progress = next;
            let run_id = match record.run_id {
                Some(id) => id,
                None => break,
            };
            let observer = record.observer.clone();
            drop(record);

            if let Some(callback) = observer {
                callback(next);
            }
            shared.emit(OperationEvent {
                run_id,
                status: OperationStatus::Running,
                progress: next,
            });
        }
    });
}

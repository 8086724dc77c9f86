// Operation lifecycle module for single-flight async tasks
//
// Provides a unified interface for:
// - Lifecycle tracking with guarded status transitions
// - Progress reporting, native or simulated
// - Graceful cancellation via CancellationToken
// - Broadcast notifications for observers

mod coordinator;
mod progress;
mod types;

pub use coordinator::OperationCoordinator;
pub use progress::{ProgressReporter, SyntheticProgress};
pub use types::{OperationEvent, OperationSnapshot, OperationStatus};

// Re-export CancellationToken for convenience
pub use tokio_util::sync::CancellationToken;

pub mod client;
pub mod config;
pub mod error;
pub mod ops;

pub use config::{ClientConfig, ConfigError};
pub use error::{OperationError, Result};
pub use ops::{
    OperationCoordinator, OperationEvent, OperationSnapshot, OperationStatus, ProgressReporter,
    SyntheticProgress,
};

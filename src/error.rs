use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("an operation is already running")]
    AlreadyRunning,

    #[error("operation was cancelled")]
    Cancelled,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Work(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OperationError>;

use thiserror::Error;

/// Errors that can occur when reading or writing persisted identities
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to open state store: {0}")]
    OpenError(String),

    #[error("State operation failed: {0}")]
    OperationError(String),

    #[error("State store is locked")]
    Locked,
}

//! Errors raised by the key-value backends.

use thiserror::Error;

/// Failure of a backend read, write or setup step.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The backend rejected or could not complete an operation.
    #[error("State backend operation failed: {0}")]
    OperationFailed(String),

    /// A stored document could not be encoded or decoded.
    #[error("State document encoding failed: {0}")]
    SerializationError(String),

    /// Schema migrations could not be applied.
    #[error("State schema migration failed: {0}")]
    MigrationError(String),

    /// The backend was configured with an unusable value, e.g. a bad URL.
    #[error("Invalid state backend input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::SerializationError(e.to_string())
    }
}

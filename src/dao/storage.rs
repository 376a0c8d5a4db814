use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed mid-operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the store was doing when the backend failed.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A write raced a row that already exists.
    #[error("write conflict: {0}")]
    Conflict(String),
    /// The referenced document does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error for a write that raced an existing row.
    pub fn conflict(message: impl Into<String>) -> Self {
        StorageError::Conflict(message.into())
    }

    /// Construct a not-found error for a missing document.
    pub fn not_found(message: impl Into<String>) -> Self {
        StorageError::NotFound(message.into())
    }
}

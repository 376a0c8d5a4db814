use thiserror::Error;

use crate::dao::storage::StorageError;

/// Errors that can surface from supervisor-level operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// No question content is available to open a game with.
    #[error("no questions available")]
    NoQuestions,
    /// Storage backend rejected or failed an operation.
    #[error("storage unavailable")]
    Storage(#[from] StorageError),
}

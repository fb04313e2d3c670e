//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database rejected or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

use std::sync::PoisonError;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record to update was not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A membership record for this `(collection, item)` pair, or an
    /// activity with this id, already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The backend could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(e: PoisonError<T>) -> Self {
        Self::Unavailable(format!("lock poisoned: {e}"))
    }
}

/// Result alias for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

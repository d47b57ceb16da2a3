use cxo_types::ContentHash;

/// Errors from storage facade operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A header expected to be stored is absent.
    #[error("header not found: {0}")]
    HeaderNotFound(ContentHash),

    /// Snapshot encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the index lock.
    #[error("index lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

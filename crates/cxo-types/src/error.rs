use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content hash: {0:?}")]
    InvalidHash(String),

    #[error("invalid root hash key: {0:?}")]
    InvalidKey(String),

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("header has no name")]
    MissingName,

    #[error("object length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: u64, actual: u64 },
}

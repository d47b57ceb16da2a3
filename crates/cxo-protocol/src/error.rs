use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid announcement: {0}")]
    Invalid(#[from] cxo_types::TypeError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

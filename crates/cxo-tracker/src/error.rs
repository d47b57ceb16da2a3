use cxo_types::ContentHash;

/// Errors from tracker fetches.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("tracker returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("undecodable tracker response: {0}")]
    Decode(String),

    #[error("invalid tracker address: {0}")]
    InvalidUrl(String),

    #[error("not found on tracker: {0}")]
    NotFound(ContentHash),

    /// A header batch did not answer every requested hash.
    #[error("header batch mismatch: requested {requested}, received {received}")]
    BatchMismatch { requested: usize, received: usize },

    #[error("tracker unavailable: {0}")]
    Unavailable(String),
}

impl TrackerError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Result alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

use std::time::Duration;

/// Default tracker address.
pub const DEFAULT_TRACKER_ADDRESS: &str = "http://127.0.0.1:8097";

/// Connection settings for [`HttpTrackerClient`](crate::HttpTrackerClient).
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Base URL; endpoint paths are appended to its path.
    pub address: String,
    /// Upper bound on a single request, connect through body.
    pub request_timeout: Duration,
    /// Extra attempts after a transient failure. Zero disables retry.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_TRACKER_ADDRESS.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl TrackerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

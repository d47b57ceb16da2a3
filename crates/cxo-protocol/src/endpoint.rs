/// HTTP endpoint paths for the node and the tracker.
pub mod endpoints {
    /// Node: root-hash announcements from the tracker.
    pub const NOTIFY: &str = "/notify";
    pub const HEALTH: &str = "/health";
    pub const INFO: &str = "/info";
    /// Tracker: batched header fetch.
    pub const OBJECT_HEADER: &str = "/data/object/header";
    /// Tracker: single object fetch.
    pub const OBJECT: &str = "/data/object";
}

/// Query parameter naming a requested hash; repeated for batches.
pub const HASH_PARAM: &str = "hash";

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}

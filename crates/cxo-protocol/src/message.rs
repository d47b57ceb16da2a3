use serde::{Deserialize, Serialize};

use cxo_types::{ObjectHeader, RootHashKey};

pub const PROTOCOL_VERSION: u32 = 1;

/// Tracker reply to a batched header fetch, in request order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetObjectHeadersResponse {
    #[serde(default)]
    pub object_headers: Vec<ObjectHeader>,
}

/// Acknowledgement for an accepted announcement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceAck {
    pub key: String,
    pub status: String,
}

impl AnnounceAck {
    pub fn accepted(key: &RootHashKey) -> Self {
        Self {
            key: key.to_string(),
            status: "accepted".into(),
        }
    }
}

/// Body returned with a rejected request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxo_types::ContentHash;

    #[test]
    fn headers_response_uses_tracker_field_names() {
        let json = r#"{"objectHeaders": [
            {"meta": [{"key": "name", "value": "a.txt"}], "externalReferences": [], "objectHash": "O1"}
        ]}"#;
        let resp: GetObjectHeadersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.object_headers.len(), 1);
        assert_eq!(
            resp.object_headers[0].object_hash,
            Some(ContentHash::new("O1").unwrap())
        );
    }

    #[test]
    fn missing_headers_field_is_empty() {
        let resp: GetObjectHeadersResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.object_headers.is_empty());
    }

    #[test]
    fn ack_carries_key() {
        let ack = AnnounceAck::accepted(&RootHashKey::new(1, "pub1"));
        assert_eq!(ack.key, "1:pub1");
        assert_eq!(ack.status, "accepted");
    }
}

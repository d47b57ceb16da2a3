use cxo_types::RootHash;

use crate::error::{ProtocolError, ProtocolResult};

/// Codec for root-hash announcements.
pub struct AnnouncementCodec;

impl AnnouncementCodec {
    /// Decode and validate an announcement body.
    ///
    /// Fails with [`ProtocolError::Malformed`] when the JSON cannot be parsed
    /// into a root-hash record and with [`ProtocolError::Invalid`] when the
    /// record is unusable (for example a publisher that is not a safe
    /// directory name).
    pub fn decode(data: &[u8]) -> ProtocolResult<RootHash> {
        let root: RootHash = serde_json::from_slice(data)?;
        root.validate()?;
        Ok(root)
    }

    pub fn encode(root: &RootHash) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(root).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}

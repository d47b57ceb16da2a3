use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;

/// Raw file content fetched from the tracker.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Declared payload length in bytes.
    pub length: u64,
    #[serde(with = "crate::serde_helpers::base64_bytes")]
    pub data: Vec<u8>,
}

impl Object {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            length: data.len() as u64,
            data,
        }
    }

    /// Hash of the payload under [`ContentHash::digest`].
    pub fn digest(&self) -> ContentHash {
        ContentHash::digest(&self.data)
    }

    /// Check that the declared length matches the payload.
    pub fn verify_length(&self) -> Result<(), TypeError> {
        let actual = self.data.len() as u64;
        if actual != self.length {
            return Err(TypeError::LengthMismatch {
                declared: self.length,
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_length() {
        let obj = Object::new(b"hello".to_vec());
        assert_eq!(obj.length, 5);
        assert!(obj.verify_length().is_ok());
    }

    #[test]
    fn decodes_base64_payload() {
        // "hello" as emitted by the tracker.
        let obj: Object = serde_json::from_str(r#"{"length": 5, "data": "aGVsbG8="}"#).unwrap();
        assert_eq!(obj.data, b"hello");
        assert!(obj.verify_length().is_ok());
    }

    #[test]
    fn null_data_is_empty() {
        let obj: Object = serde_json::from_str(r#"{"length": 0, "data": null}"#).unwrap();
        assert!(obj.data.is_empty());
    }

    #[test]
    fn length_mismatch_detected() {
        let obj: Object = serde_json::from_str(r#"{"length": 9, "data": "aGVsbG8="}"#).unwrap();
        assert_eq!(
            obj.verify_length(),
            Err(TypeError::LengthMismatch {
                declared: 9,
                actual: 5
            })
        );
    }

    #[test]
    fn debug_omits_payload() {
        let obj = Object::new(vec![0xAB; 1024]);
        let debug = format!("{obj:?}");
        assert!(debug.contains("1024"));
        assert!(!debug.contains("171"));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::name::validate_path_component;

/// Identifies one synchronization unit: `sequence:publisher`.
///
/// Ordering is by publisher first, then sequence, so a sorted collection of
/// keys groups each publisher's versions together in publication order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootHashKey {
    publisher: String,
    sequence: u64,
}

impl RootHashKey {
    pub fn new(sequence: u64, publisher: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            sequence,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }
}

impl fmt::Display for RootHashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sequence, self.publisher)
    }
}

impl fmt::Debug for RootHashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootHashKey({self})")
    }
}

impl FromStr for RootHashKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (seq, publisher) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidKey(s.to_string()))?;
        let sequence = seq
            .parse::<u64>()
            .map_err(|_| TypeError::InvalidKey(s.to_string()))?;
        if publisher.is_empty() {
            return Err(TypeError::InvalidKey(s.to_string()));
        }
        Ok(Self::new(sequence, publisher))
    }
}

impl TryFrom<String> for RootHashKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RootHashKey> for String {
    fn from(key: RootHashKey) -> Self {
        key.to_string()
    }
}

/// One published version of a publisher's object graph.
///
/// The signature is carried through storage untouched; nodes do not verify
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootHash {
    pub publisher: String,
    pub sequence: u64,
    /// Publication time; headers first stored by this version are stamped
    /// with it.
    pub timestamp: DateTime<Utc>,
    /// Hash of the root object header.
    pub object_header_hash: ContentHash,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::empty_as_none"
    )]
    pub signature: Option<String>,
}

impl RootHash {
    pub fn new(
        publisher: impl Into<String>,
        sequence: u64,
        timestamp: DateTime<Utc>,
        object_header_hash: ContentHash,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            sequence,
            timestamp,
            object_header_hash,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// The `sequence:publisher` key of this record.
    pub fn key(&self) -> RootHashKey {
        RootHashKey::new(self.sequence, self.publisher.clone())
    }

    /// Check the fields a node relies on. The publisher names a directory
    /// under the storage root and must be a single safe path component.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_path_component(&self.publisher)?;
        Ok(())
    }
}

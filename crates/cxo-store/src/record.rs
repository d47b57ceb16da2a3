use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cxo_types::{ContentHash, ObjectHeader, RootHashKey};

/// A stored header and the versions that reference it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub header: ObjectHeader,
    /// Publication timestamp of the root that first stored this header.
    /// Re-linking never moves it, which is what separates "introduced by
    /// this update" from "carried over".
    pub introduced_at: DateTime<Utc>,
    /// Root-hash keys currently linking this header.
    pub links: BTreeSet<RootHashKey>,
}

impl HeaderRecord {
    pub fn is_linked_to(&self, key: &RootHashKey) -> bool {
        self.links.contains(key)
    }
}

/// What lives at an on-disk path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    /// Header hash for directories, content hash for files.
    pub hash: ContentHash,
    /// The header that placed the path.
    pub header: ContentHash,
    /// Publisher whose tree contains the path.
    pub publisher: String,
    /// Set on a directory when something beneath it failed to materialize,
    /// so the next version writes it again instead of skipping its subtree.
    #[serde(default)]
    pub incomplete: bool,
}

impl PathRecord {
    pub fn directory(header: ContentHash, publisher: impl Into<String>) -> Self {
        Self {
            hash: header.clone(),
            header,
            publisher: publisher.into(),
            incomplete: false,
        }
    }

    pub fn file(object: ContentHash, header: ContentHash, publisher: impl Into<String>) -> Self {
        Self {
            hash: object,
            header,
            publisher: publisher.into(),
            incomplete: false,
        }
    }

    pub fn mark_incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }

    /// Whether this record shows `header` fully in place.
    pub fn is_complete_for(&self, header: &ContentHash) -> bool {
        self.header == *header && !self.incomplete
    }
}

/// Result of the atomic idempotency gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootHashClaim {
    /// The record was new and is now stored; the caller owns the update.
    Claimed,
    /// A record with this key already exists.
    AlreadyKnown,
    /// A newer sequence for the same publisher is already stored.
    Superseded { latest: u64 },
}

/// Outcome of re-linking a stored subtree to a new key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelinkOutcome {
    /// Stored headers now linked to the key.
    pub relinked: usize,
    /// Descendants referenced by the subtree but absent from the store.
    pub missing: Vec<ContentHash>,
}

/// Index sizes, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub root_hashes: usize,
    pub headers: usize,
    pub paths: usize,
    pub pending: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_record_constructors() {
        let h = ContentHash::new("H1").unwrap();
        let o = ContentHash::new("O1").unwrap();
        let dir = PathRecord::directory(h.clone(), "pub1");
        assert_eq!(dir.hash, dir.header);
        let file = PathRecord::file(o.clone(), h.clone(), "pub1");
        assert_eq!(file.hash, o);
        assert_eq!(file.header, h);
        assert!(file.is_complete_for(&h));
    }

    #[test]
    fn incomplete_directory_is_not_in_place() {
        let h = ContentHash::new("H1").unwrap();
        let dir = PathRecord::directory(h.clone(), "pub1").mark_incomplete();
        assert!(!dir.is_complete_for(&h));
        assert!(!PathRecord::directory(h, "pub1").is_complete_for(&ContentHash::new("H2").unwrap()));
    }

    #[test]
    fn older_records_default_to_complete() {
        let json = r#"{"hash":"H1","header":"H1","publisher":"pub1"}"#;
        let record: PathRecord = serde_json::from_str(json).unwrap();
        assert!(!record.incomplete);
    }
}

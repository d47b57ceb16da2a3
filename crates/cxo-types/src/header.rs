use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::name::validate_path_component;

/// Metadata key holding the display name of a node.
pub const META_NAME: &str = "name";
/// Metadata key holding the node type.
pub const META_TYPE: &str = "type";
/// `type` value that marks a directory header.
pub const TYPE_DIRECTORY: &str = "directory";

/// One metadata key/value pair of an object header.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A node of the published object graph.
///
/// Directories list their children in `external_references`; files point at
/// their content through `object_hash`. Headers are immutable once published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectHeader {
    /// Ordered metadata pairs; must include `name`.
    #[serde(default)]
    pub meta: Vec<MetaEntry>,
    /// Child header hashes (directories only).
    #[serde(default)]
    pub external_references: Vec<ContentHash>,
    /// Content hash of the raw bytes (files only).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::empty_as_none"
    )]
    pub object_hash: Option<ContentHash>,
}

impl ObjectHeader {
    /// A directory header with the given children.
    pub fn directory(name: impl Into<String>, children: Vec<ContentHash>) -> Self {
        Self {
            meta: vec![
                MetaEntry::new(META_NAME, name),
                MetaEntry::new(META_TYPE, TYPE_DIRECTORY),
            ],
            external_references: children,
            object_hash: None,
        }
    }

    /// A file header pointing at `object_hash`.
    pub fn file(name: impl Into<String>, object_hash: ContentHash) -> Self {
        Self {
            meta: vec![MetaEntry::new(META_NAME, name)],
            external_references: Vec::new(),
            object_hash: Some(object_hash),
        }
    }

    /// Append a metadata pair.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.push(MetaEntry::new(key, value));
        self
    }

    /// First metadata value stored under `key`.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.meta_value(META_NAME)
    }

    /// The name, checked for use as a single path component.
    pub fn path_name(&self) -> Result<&str, TypeError> {
        let name = self.name().ok_or(TypeError::MissingName)?;
        validate_path_component(name)
    }

    pub fn is_directory(&self) -> bool {
        self.meta
            .iter()
            .any(|entry| entry.key == META_TYPE && entry.value == TYPE_DIRECTORY)
    }

    /// Child references; empty for files.
    pub fn children(&self) -> &[ContentHash] {
        &self.external_references
    }
}

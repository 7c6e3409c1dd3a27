//! Registry document models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A note known to the local registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteRecord {
    /// Remote identifier, never changes
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Free-form metadata; `project` and `department` are searchable
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NoteRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            parent_id: None,
            created_at: now,
            updated_at: now,
            metadata: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// String value of a metadata field, if present
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A folder known to the local registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FolderRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// On-disk shape of the registry
///
/// `folder_hierarchy` maps a folder id to its ordered, duplicate-free child
/// ids (notes and folders alike).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistryDocument {
    #[serde(default)]
    pub notes: BTreeMap<String, NoteRecord>,
    #[serde(default)]
    pub folders: BTreeMap<String, FolderRecord>,
    #[serde(default)]
    pub folder_hierarchy: BTreeMap<String, Vec<String>>,
}

/// One step of a folder deletion, in the order it must happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEntry {
    Note(String),
    Folder(String),
}

impl RegistryEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Note(id) | Self::Folder(id) => id,
        }
    }
}

//! Request and result types for note and folder operations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request to create a note
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Registry id of the containing folder
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl CreateNoteRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.parent_id = Some(folder_id.into());
        self
    }
}

/// Request to update a note
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Add `content` after the existing body instead of replacing it
    #[serde(default)]
    pub append: bool,
}

/// Request to create a folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl CreateFolderRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.parent_id = Some(folder_id.into());
        self
    }
}

/// A folder located by name, locally or remotely
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// What a folder deletion removed, in removal order
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FolderDeletion {
    pub folder_id: String,
    pub deleted_notes: Vec<String>,
    pub deleted_folders: Vec<String>,
}

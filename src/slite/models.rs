//! Wire types for the Slite notes API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Whether a remote record is a document or a folder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    Note,
    Folder,
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note => write!(f, "note"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// Body of `POST /v1/notes`
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_note_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RemoteKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NoteDraft {
    /// A document with markdown content
    pub fn note(title: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            markdown: Some(markdown.into()),
            ..Self::default()
        }
    }

    /// A folder container
    pub fn folder(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: name.into(),
            kind: Some(RemoteKind::Folder),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_note_id = parent_id;
        self
    }
}

/// Body of `PUT /v1/notes/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_note_id: Option<String>,
}

/// A note as returned by the remote service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Either a markdown string or `{"markdown": ...}` depending on endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_note_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteNote {
    /// Markdown body, whichever shape the service used
    pub fn body(&self) -> String {
        if let Some(markdown) = &self.markdown {
            return markdown.clone();
        }
        match &self.content {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(obj)) => obj
                .get("markdown")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// One entry of `GET /v1/search-notes`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_note_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Search results arrive either wrapped (`{"hits": [...]}`) or as a bare list
pub(crate) fn parse_hits(value: Value) -> Result<Vec<SearchHit>, serde_json::Error> {
    match value {
        Value::Array(_) => serde_json::from_value(value),
        Value::Object(mut obj) => match obj.remove("hits") {
            Some(hits) => serde_json::from_value(hits),
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_folder_draft_serialization() {
        let draft = NoteDraft::folder("Meeting Notes", "Weekly syncs")
            .with_parent(Some("f0".into()));
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Meeting Notes",
                "type": "folder",
                "description": "Weekly syncs",
                "parentNoteId": "f0"
            })
        );
    }

    #[test]
    fn test_note_draft_omits_missing_parent() {
        let value = serde_json::to_value(NoteDraft::note("Standup", "- done")).unwrap();
        assert_eq!(value, json!({"title": "Standup", "markdown": "- done"}));
    }

    #[test]
    fn test_body_normalisation() {
        let top: RemoteNote =
            serde_json::from_value(json!({"id": "n1", "markdown": "top"})).unwrap();
        assert_eq!(top.body(), "top");

        let nested: RemoteNote = serde_json::from_value(
            json!({"id": "n1", "title": "T", "content": {"markdown": "nested"}}),
        )
        .unwrap();
        assert_eq!(nested.body(), "nested");

        let plain: RemoteNote =
            serde_json::from_value(json!({"id": "n1", "content": "plain"})).unwrap();
        assert_eq!(plain.body(), "plain");

        let empty: RemoteNote = serde_json::from_value(json!({"id": "n1"})).unwrap();
        assert_eq!(empty.body(), "");
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let note: RemoteNote = serde_json::from_value(
            json!({"id": "n1", "title": "T", "url": "https://slite.com/n1"}),
        )
        .unwrap();
        assert_eq!(note.extra.get("url"), Some(&json!("https://slite.com/n1")));
    }

    #[test]
    fn test_parse_hits_shapes() {
        let wrapped = parse_hits(json!({"hits": [{"id": "n1", "title": "A"}]})).unwrap();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].title, "A");

        let bare = parse_hits(json!([{"id": "n2"}])).unwrap();
        assert_eq!(bare[0].id, "n2");

        assert!(parse_hits(json!({"total": 0})).unwrap().is_empty());
        assert!(parse_hits(Value::Null).unwrap().is_empty());
    }
}

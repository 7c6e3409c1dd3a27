//! CRUD event types

use serde::{Deserialize, Serialize};

/// The type of entity that was mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Note,
    Folder,
}

/// The CRUD action performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudAction {
    Created,
    Updated,
    Deleted,
}

/// A CRUD event emitted after the remote service confirmed a mutation
///
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudEvent {
    /// The type of entity that was mutated
    pub entity_type: EntityType,
    /// The action performed
    pub action: CrudAction,
    /// Remote ID of the mutated entity
    pub entity_id: String,
    /// Optional payload with entity data (e.g. new title)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Containing folder, for subscriber-side filtering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl CrudEvent {
    /// Create a new CrudEvent with the current timestamp
    pub fn new(entity_type: EntityType, action: CrudAction, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            action,
            entity_id: entity_id.into(),
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
            parent_id: None,
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the containing folder
    pub fn with_parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Sink for CRUD events. Emitting never blocks and never fails.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: CrudEvent);

    fn emit_created(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: serde_json::Value,
        parent_id: Option<String>,
    ) {
        self.emit(
            CrudEvent::new(entity_type, CrudAction::Created, entity_id)
                .with_payload(payload)
                .with_parent_id(parent_id),
        );
    }

    fn emit_updated(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        payload: serde_json::Value,
        parent_id: Option<String>,
    ) {
        self.emit(
            CrudEvent::new(entity_type, CrudAction::Updated, entity_id)
                .with_payload(payload)
                .with_parent_id(parent_id),
        );
    }

    fn emit_deleted(&self, entity_type: EntityType, entity_id: &str, parent_id: Option<String>) {
        self.emit(
            CrudEvent::new(entity_type, CrudAction::Deleted, entity_id).with_parent_id(parent_id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_serialization() {
        assert_eq!(serde_json::to_string(&EntityType::Folder).unwrap(), "\"folder\"");
        let back: EntityType = serde_json::from_str("\"note\"").unwrap();
        assert_eq!(back, EntityType::Note);
    }

    #[test]
    fn test_crud_event_serde_roundtrip() {
        let event = CrudEvent::new(EntityType::Note, CrudAction::Created, "n1")
            .with_payload(serde_json::json!({"title": "Roadmap"}))
            .with_parent_id(Some("f1".into()));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: CrudEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.entity_type, EntityType::Note);
        assert_eq!(deserialized.action, CrudAction::Created);
        assert_eq!(deserialized.entity_id, "n1");
        assert_eq!(deserialized.parent_id.as_deref(), Some("f1"));
        assert_eq!(deserialized.payload["title"], "Roadmap");
    }

    #[test]
    fn test_crud_event_null_payload_omitted() {
        let event = CrudEvent::new(EntityType::Folder, CrudAction::Deleted, "f1");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("\"payload\""));
        assert!(!json.contains("\"parent_id\""));
        assert!(json.contains("\"action\":\"deleted\""));
    }
}

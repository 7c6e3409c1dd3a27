//! MCP Tool handlers
//!
//! Implements the actual logic for each MCP tool. Every tool answers with a
//! JSON object carrying `status` (`"success"` or `"error"`) and `message`;
//! failures also carry `error_kind`.

use crate::error::NotesError;
use crate::meeting::{parse_meeting_notes, MeetingNotes};
use crate::notes::{
    CreateFolderRequest, CreateNoteRequest, DeferredAction, FolderRef, NoteManager, UpdateNoteRequest,
};
use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Delay used by `schedule_note_deletion` when none is given
const DEFAULT_DELETION_DELAY: Duration = Duration::from_secs(60);

/// Default hit count for `search_remote_notes`
const DEFAULT_REMOTE_LIMIT: usize = 10;

type ToolResult = std::result::Result<Value, NotesError>;

/// Handles MCP tool calls
pub struct ToolHandler {
    manager: Arc<NoteManager>,
    scheduled: Mutex<HashMap<String, DeferredAction>>,
    /// Default parent for new notes
    selected_folder: Mutex<Option<FolderRef>>,
}

impl ToolHandler {
    pub fn new(manager: Arc<NoteManager>) -> Self {
        Self {
            manager,
            scheduled: Mutex::new(HashMap::new()),
            selected_folder: Mutex::new(None),
        }
    }

    /// Handle a tool call and return the result as JSON.
    ///
    /// Only an unknown tool name is an `Err`; operation failures come back as
    /// `status: "error"` payloads.
    pub async fn handle(&self, name: &str, args: Option<Value>) -> Result<Value> {
        let args = args.unwrap_or(json!({}));

        let outcome = match name {
            // Notes
            "search_notes" => self.search_notes(args).await,
            "search_remote_notes" => self.search_remote_notes(args).await,
            "get_note" => self.get_note(args).await,
            "create_note" => self.create_note(args).await,
            "update_note" => self.update_note(args).await,
            "rename_note" => self.rename_note(args).await,
            "delete_note" => self.delete_note(args).await,
            "create_meeting_note" => self.create_meeting_note(args).await,

            // Folders
            "list_folders" => self.list_folders().await,
            "find_folder" => self.find_folder(args).await,
            "select_folder" => self.select_folder(args).await,
            "get_selected_folder" => self.get_selected_folder().await,
            "create_folder" => self.create_folder(args).await,
            "rename_folder" => self.rename_folder(args).await,
            "move_folder" => self.move_folder(args).await,
            "delete_folder" => self.delete_folder(args).await,

            // Scheduling
            "schedule_note_deletion" => self.schedule_note_deletion(args).await,
            "cancel_scheduled_deletion" => self.cancel_scheduled_deletion(args).await,

            _ => return Err(anyhow!("Unknown tool: {}", name)),
        };

        Ok(outcome.unwrap_or_else(|e| {
            error!(tool = name, error_kind = e.kind(), error = %e, "Tool failed");
            error_payload(&e)
        }))
    }

    // ========================================================================
    // Note Handlers
    // ========================================================================

    async fn search_notes(&self, args: Value) -> ToolResult {
        let query = optional_str(&args, "query").unwrap_or_default();
        let notes = self.manager.search_notes(query).await;
        Ok(success(
            format!("Found {} matching notes", notes.len()),
            json!({"count": notes.len(), "notes": notes}),
        ))
    }

    async fn search_remote_notes(&self, args: Value) -> ToolResult {
        let query = required_str(&args, "query")?;
        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_REMOTE_LIMIT);
        let hits = self.manager.search_remote_notes(query, limit).await?;
        Ok(success(
            format!("Found {} notes in Slite", hits.len()),
            json!({"count": hits.len(), "hits": hits}),
        ))
    }

    async fn get_note(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?;
        let note = self.manager.get_note(key).await?;
        Ok(success(
            format!("Retrieved note '{}'", note.title),
            json!({
                "note": {
                    "id": note.id,
                    "title": note.title,
                    "content": note.body(),
                    "parent_id": note.parent_note_id,
                }
            }),
        ))
    }

    async fn create_note(&self, args: Value) -> ToolResult {
        let mut metadata = Map::new();
        for key in ["project", "department"] {
            if let Some(value) = optional_str(&args, key) {
                metadata.insert(key.to_string(), json!(value));
            }
        }
        let request = CreateNoteRequest {
            title: required_str(&args, "title")?.to_string(),
            content: optional_str(&args, "content").unwrap_or_default().to_string(),
            parent_id: self.parent_or_selected(&args).await,
            metadata: Some(metadata),
        };
        let note = self.manager.create_note(request).await?;
        Ok(success(
            format!("Note '{}' created", note.title),
            json!({"note_id": note.id, "note": note}),
        ))
    }

    async fn update_note(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?;
        let request = UpdateNoteRequest {
            title: optional_str(&args, "title").map(str::to_string),
            content: optional_str(&args, "content").map(str::to_string),
            append: args.get("append").and_then(|v| v.as_bool()).unwrap_or(false),
        };
        let append = request.append;
        let note = self.manager.update_note(key, request).await?;
        let verb = if append { "appended to" } else { "updated" };
        Ok(success(
            format!("Note '{}' {}", note.title, verb),
            json!({"note_id": note.id}),
        ))
    }

    async fn rename_note(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?;
        let new_title = required_str(&args, "new_title")?;
        let note = self.manager.rename_note(key, new_title).await?;
        Ok(success(
            format!("Note renamed to '{}'", note.title),
            json!({"note_id": note.id, "title": note.title}),
        ))
    }

    async fn delete_note(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?;
        let id = self.manager.delete_note(key).await?;
        Ok(success(format!("Note {} deleted", id), json!({"note_id": id})))
    }

    async fn create_meeting_note(&self, args: Value) -> ToolResult {
        let notes = if let Some(text) = optional_str(&args, "text") {
            parse_meeting_notes(text)
        } else if let Some(meeting) = args.get("meeting") {
            serde_json::from_value::<MeetingNotes>(meeting.clone())
                .map_err(|e| NotesError::InvalidInput(format!("meeting: {}", e)))?
        } else {
            return Err(NotesError::InvalidInput(
                "either text or meeting is required".into(),
            ));
        };
        let parent_id = self.parent_or_selected(&args).await;
        let sections = notes.sections.len();
        let note = self.manager.create_meeting_note(notes, parent_id).await?;
        Ok(success(
            format!("Meeting note '{}' created", note.title),
            json!({"note_id": note.id, "title": note.title, "sections": sections}),
        ))
    }

    // ========================================================================
    // Folder Handlers
    // ========================================================================

    async fn list_folders(&self) -> ToolResult {
        let folders = self.manager.list_folders().await;
        Ok(success(
            format!("{} folders", folders.len()),
            json!({"count": folders.len(), "folders": folders}),
        ))
    }

    async fn find_folder(&self, args: Value) -> ToolResult {
        let name = required_str(&args, "name")?;
        match self.manager.find_folder(name).await? {
            Some(folder) => Ok(success(
                format!("Found folder '{}'", folder.name),
                json!({"folder": folder}),
            )),
            None => Err(NotesError::FolderNotFound(name.to_string())),
        }
    }

    async fn select_folder(&self, args: Value) -> ToolResult {
        let name = required_str(&args, "name")?;
        let folder = self
            .manager
            .find_folder(name)
            .await?
            .ok_or_else(|| NotesError::FolderNotFound(name.to_string()))?;
        info!(folder_id = %folder.id, name = %folder.name, "Folder selected");
        let message = format!("Folder '{}' selected", folder.name);
        *self.selected_folder.lock().await = Some(folder.clone());
        Ok(success(message, json!({"folder": folder})))
    }

    async fn get_selected_folder(&self) -> ToolResult {
        match self.selected_folder.lock().await.clone() {
            Some(folder) => Ok(success(
                format!("Selected folder is '{}'", folder.name),
                json!({"folder": folder}),
            )),
            None => Ok(success("No folder selected".to_string(), json!({"folder": null}))),
        }
    }

    /// Explicit `parent_id`, else the selected folder
    async fn parent_or_selected(&self, args: &Value) -> Option<String> {
        match optional_str(args, "parent_id") {
            Some(id) => Some(id.to_string()),
            None => self.selected_folder.lock().await.as_ref().map(|f| f.id.clone()),
        }
    }

    async fn create_folder(&self, args: Value) -> ToolResult {
        let request = CreateFolderRequest {
            name: required_str(&args, "name")?.to_string(),
            description: optional_str(&args, "description").map(str::to_string),
            parent_id: optional_str(&args, "parent_id").map(str::to_string),
        };
        let folder = self.manager.create_folder(request).await?;
        Ok(success(
            format!("Folder '{}' created", folder.name),
            json!({"folder_id": folder.id, "folder": folder}),
        ))
    }

    async fn rename_folder(&self, args: Value) -> ToolResult {
        let folder_id = required_str(&args, "folder_id")?;
        let new_name = required_str(&args, "new_name")?;
        let folder = self.manager.rename_folder(folder_id, new_name).await?;
        if let Some(selected) = self.selected_folder.lock().await.as_mut() {
            if selected.id == folder.id {
                selected.name = folder.name.clone();
            }
        }
        Ok(success(
            format!("Folder renamed to '{}'", folder.name),
            json!({"folder_id": folder.id, "name": folder.name}),
        ))
    }

    async fn move_folder(&self, args: Value) -> ToolResult {
        let folder_id = required_str(&args, "folder_id")?;
        let new_parent_id = required_str(&args, "new_parent_id")?;
        let folder = self.manager.move_folder(folder_id, new_parent_id).await?;
        Ok(success(
            format!("Folder '{}' moved", folder.name),
            json!({"folder_id": folder.id, "parent_id": folder.parent_id}),
        ))
    }

    async fn delete_folder(&self, args: Value) -> ToolResult {
        let folder_id = required_str(&args, "folder_id")?;
        let deletion = self.manager.delete_folder(folder_id).await?;
        {
            let mut selected = self.selected_folder.lock().await;
            if selected
                .as_ref()
                .is_some_and(|f| deletion.deleted_folders.contains(&f.id))
            {
                *selected = None;
            }
        }
        Ok(success(
            format!(
                "Folder {} deleted with {} notes and {} subfolders",
                folder_id,
                deletion.deleted_notes.len(),
                deletion.deleted_folders.len().saturating_sub(1)
            ),
            json!({
                "folder_id": deletion.folder_id,
                "deleted_notes": deletion.deleted_notes,
                "deleted_folders": deletion.deleted_folders,
            }),
        ))
    }

    // ========================================================================
    // Scheduling Handlers
    // ========================================================================

    async fn schedule_note_deletion(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?.to_string();
        let delay = args
            .get("delay_seconds")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_DELETION_DELAY);

        let manager = self.manager.clone();
        let target = key.clone();
        let action = DeferredAction::schedule(format!("delete {}", key), delay, move || async move {
            match manager.delete_note(&target).await {
                Ok(id) => info!(note_id = %id, "Scheduled deletion completed"),
                Err(e) => warn!(note = %target, error = %e, "Scheduled deletion failed"),
            }
        });

        let mut scheduled = self.scheduled.lock().await;
        scheduled.retain(|_, a| !a.is_finished());
        if let Some(previous) = scheduled.insert(key.clone(), action) {
            if previous.cancel() {
                info!(label = %previous.label(), "Replaced pending deferred action");
            }
        }
        Ok(success(
            format!("Note {} will be deleted in {} seconds", key, delay.as_secs()),
            json!({"note_id": key, "delay_seconds": delay.as_secs()}),
        ))
    }

    async fn cancel_scheduled_deletion(&self, args: Value) -> ToolResult {
        let key = required_str(&args, "note_id")?;
        let action = self.scheduled.lock().await.remove(key);
        match action {
            Some(action) if action.cancel() => {
                info!(label = %action.label(), "Deferred action cancelled");
                Ok(success(
                    format!("Scheduled deletion of {} cancelled", key),
                    json!({"note_id": key, "cancelled": true}),
                ))
            }
            Some(_) => Err(NotesError::InvalidInput(format!(
                "deletion of {} already ran",
                key
            ))),
            None => Err(NotesError::InvalidInput(format!(
                "no deletion scheduled for {}",
                key
            ))),
        }
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

fn success(message: String, extra: Value) -> Value {
    let mut payload = json!({"status": "success", "message": message});
    if let (Some(obj), Value::Object(extra)) = (payload.as_object_mut(), extra) {
        obj.extend(extra);
    }
    payload
}

fn error_payload(err: &NotesError) -> Value {
    let mut payload = json!({
        "status": "error",
        "message": err.to_string(),
        "error_kind": err.kind(),
    });
    if let NotesError::PartiallyApplied { operation, id, .. } = err {
        payload["operation"] = json!(operation);
        payload["id"] = json!(id);
    }
    payload
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn required_str<'a>(args: &'a Value, key: &str) -> std::result::Result<&'a str, NotesError> {
    optional_str(args, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NotesError::InvalidInput(format!("{} is required", key)))
}

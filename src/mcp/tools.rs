//! MCP Tool definitions
//!
//! Defines the 18 note and folder tools exposed by the MCP server.

use super::protocol::{InputSchema, ToolDefinition};
use serde_json::{json, Value};

/// Generate all tool definitions
pub fn all_tools() -> Vec<ToolDefinition> {
    let mut tools = Vec::new();
    tools.extend(note_tools());
    tools.extend(folder_tools());
    tools.extend(scheduling_tools());
    tools
}

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: InputSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required.iter().map(|s| s.to_string()).collect())
            },
        },
    }
}

// ============================================================================
// Note Tools (8)
// ============================================================================

fn note_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "search_notes",
            "Search registered notes by title, project or department (case-insensitive)",
            json!({
                "query": {"type": "string", "description": "Text to look for; empty lists every note"}
            }),
            &[],
        ),
        tool(
            "search_remote_notes",
            "Full-text search in Slite, including notes not created through this server",
            json!({
                "query": {"type": "string", "description": "Search query"},
                "limit": {"type": "integer", "description": "Max hits (default 10)"}
            }),
            &["query"],
        ),
        tool(
            "get_note",
            "Get a note's title and markdown content",
            json!({
                "note_id": {"type": "string", "description": "Note id or exact title"}
            }),
            &["note_id"],
        ),
        tool(
            "create_note",
            "Create a note, optionally inside a folder",
            json!({
                "title": {"type": "string", "description": "Note title"},
                "content": {"type": "string", "description": "Markdown content"},
                "parent_id": {"type": "string", "description": "Folder id (defaults to the selected folder)"},
                "project": {"type": "string", "description": "Project tag used by search_notes"},
                "department": {"type": "string", "description": "Department tag used by search_notes"}
            }),
            &["title"],
        ),
        tool(
            "update_note",
            "Replace or append to a note's content and/or change its title",
            json!({
                "note_id": {"type": "string", "description": "Note id or title"},
                "title": {"type": "string", "description": "New title"},
                "content": {"type": "string", "description": "New markdown content"},
                "append": {"type": "boolean", "description": "Append content after the existing body (default false)"}
            }),
            &["note_id"],
        ),
        tool(
            "rename_note",
            "Change a note's title, keeping its content",
            json!({
                "note_id": {"type": "string", "description": "Note id or title"},
                "new_title": {"type": "string", "description": "New title"}
            }),
            &["note_id", "new_title"],
        ),
        tool(
            "delete_note",
            "Delete a note",
            json!({
                "note_id": {"type": "string", "description": "Note id or exact title"}
            }),
            &["note_id"],
        ),
        tool(
            "create_meeting_note",
            "Create a formatted meeting note from raw meeting text or structured JSON",
            json!({
                "text": {"type": "string", "description": "Raw meeting notes text"},
                "meeting": {"type": "object", "description": "Structured meeting notes (title, metadata, sections)"},
                "parent_id": {"type": "string", "description": "Folder id (defaults to the selected folder)"}
            }),
            &[],
        ),
    ]
}

// ============================================================================
// Folder Tools (8)
// ============================================================================

fn folder_tools() -> Vec<ToolDefinition> {
    vec![
        tool("list_folders", "List registered folders", json!({}), &[]),
        tool(
            "find_folder",
            "Find a folder by exact name, locally or in Slite",
            json!({
                "name": {"type": "string", "description": "Folder name"}
            }),
            &["name"],
        ),
        tool(
            "select_folder",
            "Select a folder by name; new notes go there when no parent_id is given",
            json!({
                "name": {"type": "string", "description": "Folder name"}
            }),
            &["name"],
        ),
        tool("get_selected_folder", "Show the selected folder", json!({}), &[]),
        tool(
            "create_folder",
            "Create a folder, optionally inside another folder",
            json!({
                "name": {"type": "string", "description": "Folder name"},
                "description": {"type": "string", "description": "Folder description"},
                "parent_id": {"type": "string", "description": "Parent folder id"}
            }),
            &["name"],
        ),
        tool(
            "rename_folder",
            "Rename a folder",
            json!({
                "folder_id": {"type": "string", "description": "Folder id"},
                "new_name": {"type": "string", "description": "New name"}
            }),
            &["folder_id", "new_name"],
        ),
        tool(
            "move_folder",
            "Move a folder under another folder",
            json!({
                "folder_id": {"type": "string", "description": "Folder id"},
                "new_parent_id": {"type": "string", "description": "Destination folder id"}
            }),
            &["folder_id", "new_parent_id"],
        ),
        tool(
            "delete_folder",
            "Delete a folder with all its notes and subfolders",
            json!({
                "folder_id": {"type": "string", "description": "Folder id"}
            }),
            &["folder_id"],
        ),
    ]
}

// ============================================================================
// Scheduling Tools (2)
// ============================================================================

fn scheduling_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "schedule_note_deletion",
            "Delete a note after a delay unless cancelled",
            json!({
                "note_id": {"type": "string", "description": "Note id or exact title"},
                "delay_seconds": {"type": "integer", "description": "Delay before deletion (default 60)"}
            }),
            &["note_id"],
        ),
        tool(
            "cancel_scheduled_deletion",
            "Cancel a pending scheduled deletion",
            json!({
                "note_id": {"type": "string", "description": "Note id or title used when scheduling"}
            }),
            &["note_id"],
        ),
    ]
}

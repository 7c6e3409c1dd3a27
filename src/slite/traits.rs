//! Trait abstraction for the remote note service

use super::models::{NoteDraft, NotePatch, RemoteKind, RemoteNote, SearchHit};
use crate::error::ApiError;
use async_trait::async_trait;

/// Remote note operations, already wrapped in rate limiting and retry.
///
/// Folders are notes too: they are created with `RemoteKind::Folder` and
/// deleted through `delete_note`.
#[async_trait]
pub trait NoteApi: Send + Sync {
    /// Create a note or folder and return the remote record with its id
    async fn create_note(&self, draft: &NoteDraft) -> Result<RemoteNote, ApiError>;

    /// Fetch a single note
    async fn get_note(&self, id: &str) -> Result<RemoteNote, ApiError>;

    /// Replace title, content and/or parent of a note
    async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RemoteNote, ApiError>;

    /// Delete a note or folder
    async fn delete_note(&self, id: &str) -> Result<(), ApiError>;

    /// Full-text search on the remote side
    async fn search_notes(
        &self,
        query: &str,
        kind: RemoteKind,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError>;
}

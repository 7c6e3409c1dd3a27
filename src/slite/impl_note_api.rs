//! NoteApi trait implementation for SliteClient
//!
//! Each trait method delegates directly to the corresponding inherent method
//! on `SliteClient`.

use async_trait::async_trait;

use super::client::SliteClient;
use super::models::{NoteDraft, NotePatch, RemoteKind, RemoteNote, SearchHit};
use super::traits::NoteApi;
use crate::error::ApiError;

#[async_trait]
impl NoteApi for SliteClient {
    async fn create_note(&self, draft: &NoteDraft) -> Result<RemoteNote, ApiError> {
        self.create_note(draft).await
    }

    async fn get_note(&self, id: &str) -> Result<RemoteNote, ApiError> {
        self.get_note(id).await
    }

    async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RemoteNote, ApiError> {
        self.update_note(id, patch).await
    }

    async fn delete_note(&self, id: &str) -> Result<(), ApiError> {
        self.delete_note(id).await
    }

    async fn search_notes(
        &self,
        query: &str,
        kind: RemoteKind,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError> {
        self.search_notes(query, kind, limit).await
    }
}

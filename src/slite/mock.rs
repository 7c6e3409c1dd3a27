//! In-memory mock implementation of NoteApi for testing without the remote service.

use super::models::*;
use super::traits::NoteApi;
use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::{Mutex, RwLock};

/// In-memory mock implementation of NoteApi.
///
/// Folders get ids `f1`, `f2`... and notes `n1`, `n2`... in creation order.
/// Every call is appended to a log (`"POST note"`, `"DELETE n1"`...) so tests
/// can assert on remote ordering. Errors queued with `fail_next` or `fail_on`
/// are returned before any state is touched, one per matching call.
pub struct MockNoteApi {
    notes: RwLock<BTreeMap<String, (RemoteKind, RemoteNote)>>,
    counters: Mutex<(u32, u32)>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<(Option<String>, ApiError)>>,
}

impl MockNoteApi {
    /// Create a new empty mock service.
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(BTreeMap::new()),
            counters: Mutex::new((0, 0)),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Make the next call fail with `err`
    pub async fn fail_next(&self, err: ApiError) {
        self.failures.lock().await.push_back((None, err));
    }

    /// Make the next call logged as `call` (e.g. `"DELETE n2"`) fail with `err`
    pub async fn fail_on(&self, call: &str, err: ApiError) {
        self.failures
            .lock()
            .await
            .push_back((Some(call.to_string()), err));
    }

    /// Calls received so far
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Whether the remote side still holds `id`
    pub async fn contains(&self, id: &str) -> bool {
        self.notes.read().await.contains_key(id)
    }

    /// Seed a note directly, bypassing the call log
    pub async fn seed(&self, id: &str, title: &str, markdown: &str) {
        let note = RemoteNote {
            id: id.to_string(),
            title: title.to_string(),
            markdown: Some(markdown.to_string()),
            ..RemoteNote::default()
        };
        self.notes
            .write()
            .await
            .insert(id.to_string(), (RemoteKind::Note, note));
    }

    async fn record(&self, call: String) -> Result<(), ApiError> {
        let mut failures = self.failures.lock().await;
        let matching = failures
            .iter()
            .position(|(target, _)| target.as_deref().is_none_or(|t| t == call));
        self.calls.lock().await.push(call);
        match matching.and_then(|i| failures.remove(i)) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MockNoteApi {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound {
        path: format!("/v1/notes/{}", id),
    }
}

#[async_trait]
impl NoteApi for MockNoteApi {
    async fn create_note(&self, draft: &NoteDraft) -> Result<RemoteNote, ApiError> {
        let kind = draft.kind.unwrap_or(RemoteKind::Note);
        self.record(format!("POST {}", kind)).await?;

        let id = {
            let mut counters = self.counters.lock().await;
            match kind {
                RemoteKind::Folder => {
                    counters.0 += 1;
                    format!("f{}", counters.0)
                }
                RemoteKind::Note => {
                    counters.1 += 1;
                    format!("n{}", counters.1)
                }
            }
        };

        let note = RemoteNote {
            id: id.clone(),
            title: draft.title.clone(),
            markdown: draft.markdown.clone(),
            parent_note_id: draft.parent_note_id.clone(),
            ..RemoteNote::default()
        };
        self.notes.write().await.insert(id, (kind, note.clone()));
        Ok(note)
    }

    async fn get_note(&self, id: &str) -> Result<RemoteNote, ApiError> {
        self.record(format!("GET {}", id)).await?;
        self.notes
            .read()
            .await
            .get(id)
            .map(|(_, note)| note.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RemoteNote, ApiError> {
        self.record(format!("PUT {}", id)).await?;
        let mut notes = self.notes.write().await;
        let (_, note) = notes.get_mut(id).ok_or_else(|| not_found(id))?;
        if let Some(title) = &patch.title {
            note.title = title.clone();
        }
        if let Some(markdown) = &patch.markdown {
            note.markdown = Some(markdown.clone());
        }
        if let Some(parent) = &patch.parent_note_id {
            note.parent_note_id = Some(parent.clone());
        }
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("DELETE {}", id)).await?;
        self.notes
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn search_notes(
        &self,
        query: &str,
        kind: RemoteKind,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError> {
        self.record(format!("SEARCH {} {}", kind, query)).await?;
        let query_lower = query.to_lowercase();
        let notes = self.notes.read().await;
        Ok(notes
            .values()
            .filter(|(k, note)| *k == kind && note.title.to_lowercase().contains(&query_lower))
            .take(limit)
            .map(|(_, note)| SearchHit {
                id: note.id.clone(),
                title: note.title.clone(),
                parent_note_id: note.parent_note_id.clone(),
                ..SearchHit::default()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_follow_kind_and_order() {
        let api = MockNoteApi::new();
        let f = api
            .create_note(&NoteDraft::folder("Projects", ""))
            .await
            .unwrap();
        let n = api.create_note(&NoteDraft::note("Plan", "")).await.unwrap();
        assert_eq!(f.id, "f1");
        assert_eq!(n.id, "n1");
        assert_eq!(api.calls().await, vec!["POST folder", "POST note"]);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_state_untouched() {
        let api = MockNoteApi::new();
        api.seed("n9", "Seeded", "body").await;
        api.fail_next(ApiError::Transport("reset".into())).await;
        assert!(api.delete_note("n9").await.is_err());
        assert!(api.contains("n9").await);
        api.delete_note("n9").await.unwrap();
        assert!(!api.contains("n9").await);
        assert!(api.delete_note("n9").await.unwrap_err().is_not_found());
    }
}

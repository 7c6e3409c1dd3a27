//! Note Manager - remote-first CRUD for notes and folders
//!
//! Every mutation follows the same sequence: the remote service is called
//! first, the local registry is updated only once it confirms, and the
//! registry is saved before the operation reports success. A failed save
//! after a confirmed remote mutation is reported as
//! `NotesError::PartiallyApplied`. Mutations hold the registry lock for their
//! whole duration, so no two remote mutations run concurrently.

use super::models::*;
use crate::cache::{folder_key, note_key, TtlCache, FOLDER_TTL, NOTE_TTL};
use crate::error::{NotesError, RegistryError};
use crate::events::{EntityType, EventEmitter};
use crate::meeting::{format_markdown, render_in_background, MeetingNotes};
use crate::registry::{FolderRecord, NoteRecord, RegistryDocument, RegistryEntry, RegistryStore};
use crate::slite::{NoteApi, NoteDraft, NotePatch, RemoteKind, RemoteNote, SearchHit};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Hits requested when resolving a title remotely
const TITLE_SEARCH_LIMIT: usize = 10;

/// Title used for meeting notes without one
const UNTITLED_MEETING: &str = "Untitled Meeting";

/// Something removed during a deletion, announced once the lock is released
struct Removal {
    entity_type: EntityType,
    id: String,
    parent_id: Option<String>,
    cache_key: String,
}

/// Manager for note and folder operations
pub struct NoteManager {
    api: Arc<dyn NoteApi>,
    registry: Mutex<RegistryStore>,
    cache: Mutex<TtlCache>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
    note_ttl: Duration,
    folder_ttl: Duration,
}

impl NoteManager {
    /// Create a new NoteManager owning its registry and cache
    pub fn new(api: Arc<dyn NoteApi>, registry: RegistryStore, cache: TtlCache) -> Self {
        Self {
            api,
            registry: Mutex::new(registry),
            cache: Mutex::new(cache),
            event_emitter: None,
            note_ttl: NOTE_TTL,
            folder_ttl: FOLDER_TTL,
        }
    }

    /// Emit CRUD events after confirmed mutations (builder pattern)
    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    /// Override cache lifetimes (builder pattern)
    pub fn with_cache_ttls(mut self, note_ttl: Duration, folder_ttl: Duration) -> Self {
        self.note_ttl = note_ttl;
        self.folder_ttl = folder_ttl;
        self
    }

    /// Emit a created event (no-op if event_emitter is None)
    fn emit_created(&self, entity_type: EntityType, id: &str, payload: Value, parent_id: Option<String>) {
        if let Some(emitter) = &self.event_emitter {
            emitter.emit_created(entity_type, id, payload, parent_id);
        }
    }

    /// Emit an updated event (no-op if event_emitter is None)
    fn emit_updated(&self, entity_type: EntityType, id: &str, payload: Value, parent_id: Option<String>) {
        if let Some(emitter) = &self.event_emitter {
            emitter.emit_updated(entity_type, id, payload, parent_id);
        }
    }

    /// Emit a deleted event (no-op if event_emitter is None)
    fn emit_deleted(&self, entity_type: EntityType, id: &str, parent_id: Option<String>) {
        if let Some(emitter) = &self.event_emitter {
            emitter.emit_deleted(entity_type, id, parent_id);
        }
    }

    /// Copy of the registry document
    pub async fn snapshot(&self) -> RegistryDocument {
        self.registry.lock().await.document().clone()
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// Create a note, optionally inside a registered folder
    pub async fn create_note(&self, input: CreateNoteRequest) -> Result<NoteRecord, NotesError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(NotesError::InvalidInput("note title must not be empty".into()));
        }

        let mut registry = self.registry.lock().await;
        if let Some(parent) = &input.parent_id {
            if registry.get_folder(parent).is_none() {
                return Err(NotesError::FolderNotFound(parent.clone()));
            }
        }

        let draft = NoteDraft::note(&title, &input.content).with_parent(input.parent_id.clone());
        let remote = self
            .api
            .create_note(&draft)
            .await
            .map_err(|e| failed("create_note", &title, e))?;

        let record = NoteRecord::new(&remote.id, title, input.content)
            .with_parent(input.parent_id)
            .with_metadata(input.metadata.unwrap_or_default());
        registry
            .insert_note(record.clone())
            .map_err(|source| partially_applied("create_note", &record.id, source))?;
        persist(&registry, "create_note", &record.id)?;
        drop(registry);

        self.cache_record(&record).await;
        info!(note_id = %record.id, title = %record.title, "Note created");
        self.emit_created(
            EntityType::Note,
            &record.id,
            json!({"title": record.title}),
            record.parent_id.clone(),
        );
        Ok(record)
    }

    /// Fetch a note by registry id, title or remote id
    pub async fn get_note(&self, id_or_title: &str) -> Result<RemoteNote, NotesError> {
        let id = {
            let registry = self.registry.lock().await;
            self.resolve_note(&registry, id_or_title, true).await?
        };
        self.fetch_note(&id).await
    }

    /// Replace or append to a note's content and/or change its title
    pub async fn update_note(
        &self,
        id_or_title: &str,
        input: UpdateNoteRequest,
    ) -> Result<RemoteNote, NotesError> {
        if input.title.is_none() && input.content.is_none() {
            return Err(NotesError::InvalidInput(
                "update needs a new title or new content".into(),
            ));
        }

        let mut registry = self.registry.lock().await;
        let id = self.resolve_note(&registry, id_or_title, true).await?;
        let local = registry.get_note(&id).cloned();

        let markdown = match input.content {
            Some(content) if input.append => {
                let existing = self.existing_body(&id, local.as_ref()).await;
                if existing.trim().is_empty() {
                    Some(content)
                } else {
                    Some(format!("{}\n\n{}", existing, content))
                }
            }
            other => other,
        };

        let patch = NotePatch {
            title: input
                .title
                .clone()
                .or_else(|| local.as_ref().map(|n| n.title.clone())),
            markdown: markdown.clone(),
            parent_note_id: None,
        };
        let remote = self
            .api
            .update_note(&id, &patch)
            .await
            .map_err(|e| failed("update_note", &id, e))?;

        if local.is_some() {
            registry
                .update_note(&id, input.title.clone(), markdown)
                .map_err(|source| partially_applied("update_note", &id, source))?;
            persist(&registry, "update_note", &id)?;
        }
        let parent_id = local.and_then(|n| n.parent_id);
        drop(registry);

        self.cache.lock().await.remove(&note_key(&id));
        info!(note_id = %id, append = input.append, "Note updated");
        self.emit_updated(
            EntityType::Note,
            &id,
            json!({"title": patch.title, "append": input.append}),
            parent_id,
        );
        Ok(remote)
    }

    /// Change a note's title, keeping its content
    pub async fn rename_note(&self, id_or_title: &str, new_title: &str) -> Result<RemoteNote, NotesError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(NotesError::InvalidInput("new title must not be empty".into()));
        }

        let mut registry = self.registry.lock().await;
        let id = self.resolve_note(&registry, id_or_title, true).await?;
        let body = self.fetch_note(&id).await?.body();

        let patch = NotePatch {
            title: Some(new_title.to_string()),
            markdown: Some(body),
            parent_note_id: None,
        };
        let remote = self
            .api
            .update_note(&id, &patch)
            .await
            .map_err(|e| failed("rename_note", &id, e))?;

        let parent_id = registry.get_note(&id).and_then(|n| n.parent_id.clone());
        if registry.get_note(&id).is_some() {
            registry
                .update_note(&id, Some(new_title.to_string()), None)
                .map_err(|source| partially_applied("rename_note", &id, source))?;
            persist(&registry, "rename_note", &id)?;
        }
        drop(registry);

        self.cache.lock().await.remove(&note_key(&id));
        info!(note_id = %id, title = %new_title, "Note renamed");
        self.emit_updated(
            EntityType::Note,
            &id,
            json!({"title": new_title}),
            parent_id,
        );
        Ok(remote)
    }

    /// Delete a note by registry id, exact title or remote id.
    ///
    /// Returns the id that was deleted. A note the remote side no longer has
    /// is treated as deleted.
    pub async fn delete_note(&self, id_or_title: &str) -> Result<String, NotesError> {
        let mut registry = self.registry.lock().await;
        let id = self.resolve_note(&registry, id_or_title, false).await?;
        self.delete_remote(&id).await?;

        let removed = registry.remove_note(&id);
        if removed.is_some() {
            persist(&registry, "delete_note", &id)?;
        }
        drop(registry);

        self.announce_removals(vec![Removal {
            entity_type: EntityType::Note,
            cache_key: note_key(&id),
            parent_id: removed.and_then(|n| n.parent_id),
            id: id.clone(),
        }])
        .await;
        info!(note_id = %id, "Note deleted");
        Ok(id)
    }

    /// Case-insensitive search over registered notes (title, project, department)
    pub async fn search_notes(&self, query: &str) -> Vec<NoteRecord> {
        let registry = self.registry.lock().await;
        let hits: Vec<NoteRecord> = registry.search_notes(query).into_iter().cloned().collect();
        debug!(query, hits = hits.len(), "Local note search");
        hits
    }

    /// Full-text search on the remote service
    pub async fn search_remote_notes(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, NotesError> {
        self.api
            .search_notes(query, RemoteKind::Note, limit)
            .await
            .map_err(|e| failed("search_remote_notes", query, e).into())
    }

    /// Render structured meeting notes to markdown and store them as a note
    pub async fn create_meeting_note(
        &self,
        notes: MeetingNotes,
        parent_id: Option<String>,
    ) -> Result<NoteRecord, NotesError> {
        let title = if notes.title.trim().is_empty() {
            UNTITLED_MEETING.to_string()
        } else {
            notes.title.trim().to_string()
        };

        let mut metadata = Map::new();
        metadata.insert("kind".into(), json!("meeting"));
        if let Some(date) = &notes.metadata.date {
            metadata.insert("date".into(), json!(date));
        }
        if let Some(topic) = &notes.metadata.topic {
            metadata.insert("topic".into(), json!(topic));
        }

        let content = match render_in_background(notes.clone()).await {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(error = %e, "Background rendering failed, rendering inline");
                format_markdown(&notes)
            }
        };

        self.create_note(CreateNoteRequest {
            title,
            content,
            parent_id,
            metadata: Some(metadata),
        })
        .await
    }

    // ========================================================================
    // Folders
    // ========================================================================

    /// Create a folder, optionally inside a registered folder
    pub async fn create_folder(&self, input: CreateFolderRequest) -> Result<FolderRecord, NotesError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(NotesError::InvalidInput("folder name must not be empty".into()));
        }

        let mut registry = self.registry.lock().await;
        if let Some(parent) = &input.parent_id {
            if registry.get_folder(parent).is_none() {
                return Err(NotesError::FolderNotFound(parent.clone()));
            }
        }

        let description = input.description.unwrap_or_default();
        let draft = NoteDraft::folder(&name, &description).with_parent(input.parent_id.clone());
        let remote = self
            .api
            .create_note(&draft)
            .await
            .map_err(|e| failed("create_folder", &name, e))?;

        let record = FolderRecord::new(&remote.id, name, description).with_parent(input.parent_id);
        registry
            .insert_folder(record.clone())
            .map_err(|source| partially_applied("create_folder", &record.id, source))?;
        persist(&registry, "create_folder", &record.id)?;
        drop(registry);

        self.cache_folder(&FolderRef::from(&record)).await;
        info!(folder_id = %record.id, name = %record.name, "Folder created");
        self.emit_created(
            EntityType::Folder,
            &record.id,
            json!({"name": record.name}),
            record.parent_id.clone(),
        );
        Ok(record)
    }

    /// Rename a registered folder
    pub async fn rename_folder(&self, folder_id: &str, new_name: &str) -> Result<FolderRecord, NotesError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(NotesError::InvalidInput("new folder name must not be empty".into()));
        }

        let mut registry = self.registry.lock().await;
        let old_name = registry
            .get_folder(folder_id)
            .map(|f| f.name.clone())
            .ok_or_else(|| NotesError::FolderNotFound(folder_id.to_string()))?;

        let patch = NotePatch {
            title: Some(new_name.to_string()),
            ..NotePatch::default()
        };
        self.api
            .update_note(folder_id, &patch)
            .await
            .map_err(|e| failed("rename_folder", folder_id, e))?;

        let record = registry
            .update_folder(folder_id, Some(new_name.to_string()), None)
            .map_err(|source| partially_applied("rename_folder", folder_id, source))?
            .clone();
        persist(&registry, "rename_folder", folder_id)?;
        drop(registry);

        {
            let mut cache = self.cache.lock().await;
            cache.remove(&folder_key(&old_name));
        }
        self.cache_folder(&FolderRef::from(&record)).await;
        info!(folder_id, from = %old_name, to = %new_name, "Folder renamed");
        self.emit_updated(
            EntityType::Folder,
            folder_id,
            json!({"name": new_name}),
            record.parent_id.clone(),
        );
        Ok(record)
    }

    /// Move a registered folder under another registered folder
    pub async fn move_folder(&self, folder_id: &str, new_parent_id: &str) -> Result<FolderRecord, NotesError> {
        let mut registry = self.registry.lock().await;
        registry.check_move(folder_id, Some(new_parent_id)).map_err(|e| match e {
            RegistryError::UnknownFolder(id) => NotesError::FolderNotFound(id),
            other => NotesError::Registry(other),
        })?;

        let patch = NotePatch {
            parent_note_id: Some(new_parent_id.to_string()),
            ..NotePatch::default()
        };
        self.api
            .update_note(folder_id, &patch)
            .await
            .map_err(|e| failed("move_folder", folder_id, e))?;

        registry
            .move_folder(folder_id, Some(new_parent_id))
            .map_err(|source| partially_applied("move_folder", folder_id, source))?;
        persist(&registry, "move_folder", folder_id)?;
        let record = registry
            .get_folder(folder_id)
            .cloned()
            .ok_or_else(|| NotesError::FolderNotFound(folder_id.to_string()))?;
        drop(registry);

        self.cache_folder(&FolderRef::from(&record)).await;
        info!(folder_id, parent_id = %new_parent_id, "Folder moved");
        self.emit_updated(
            EntityType::Folder,
            folder_id,
            json!({"parent_id": new_parent_id}),
            Some(new_parent_id.to_string()),
        );
        Ok(record)
    }

    /// Delete a registered folder and everything below it.
    ///
    /// Descendants are deleted remotely leaves first, each one removed from
    /// the registry as soon as the remote side confirms. If a remote delete
    /// fails the cascade stops, the removals done so far are saved and the
    /// error is returned. If that save fails the result is `PartiallyApplied`.
    pub async fn delete_folder(&self, folder_id: &str) -> Result<FolderDeletion, NotesError> {
        let mut registry = self.registry.lock().await;
        if registry.get_folder(folder_id).is_none() {
            return Err(NotesError::FolderNotFound(folder_id.to_string()));
        }

        let mut plan = registry.collect_descendants(folder_id)?;
        plan.push(RegistryEntry::Folder(folder_id.to_string()));
        info!(folder_id, entries = plan.len(), "Deleting folder");

        let mut outcome = FolderDeletion {
            folder_id: folder_id.to_string(),
            ..FolderDeletion::default()
        };
        let mut removals = Vec::with_capacity(plan.len());

        for entry in &plan {
            if let Err(e) = self.delete_remote(entry.id()).await {
                warn!(
                    folder_id,
                    removed = removals.len(),
                    remaining = plan.len() - removals.len(),
                    error = %e,
                    "Folder deletion interrupted"
                );
                if removals.is_empty() {
                    return Err(e);
                }
                let saved = persist(&registry, "delete_folder", folder_id);
                drop(registry);
                self.announce_removals(removals).await;
                saved?;
                return Err(e);
            }

            match entry {
                RegistryEntry::Note(id) => {
                    let parent_id = registry.remove_note(id).and_then(|n| n.parent_id);
                    outcome.deleted_notes.push(id.clone());
                    removals.push(Removal {
                        entity_type: EntityType::Note,
                        id: id.clone(),
                        parent_id,
                        cache_key: note_key(id),
                    });
                }
                RegistryEntry::Folder(id) => {
                    let removed = registry.remove_folder(id);
                    outcome.deleted_folders.push(id.clone());
                    removals.push(Removal {
                        entity_type: EntityType::Folder,
                        id: id.clone(),
                        cache_key: folder_key(removed.as_ref().map(|f| f.name.as_str()).unwrap_or(id)),
                        parent_id: removed.and_then(|f| f.parent_id),
                    });
                }
            }
        }

        let saved = persist(&registry, "delete_folder", folder_id);
        drop(registry);
        self.announce_removals(removals).await;
        saved?;

        info!(
            folder_id,
            notes = outcome.deleted_notes.len(),
            folders = outcome.deleted_folders.len(),
            "Folder deleted"
        );
        Ok(outcome)
    }

    /// Registered folders, sorted by name
    pub async fn list_folders(&self) -> Vec<FolderRecord> {
        let registry = self.registry.lock().await;
        let mut folders: Vec<FolderRecord> = registry.folders().cloned().collect();
        folders.sort_by_key(|f| f.name.to_lowercase());
        folders
    }

    /// Direct children of a registered folder
    pub async fn folder_children(&self, folder_id: &str) -> Result<Vec<String>, NotesError> {
        let registry = self.registry.lock().await;
        if registry.get_folder(folder_id).is_none() {
            return Err(NotesError::FolderNotFound(folder_id.to_string()));
        }
        Ok(registry.children(folder_id).to_vec())
    }

    /// Locate a folder by exact (case-insensitive) name.
    ///
    /// Looks in the cache, then the registry, then the remote service.
    /// Found folders are cached for the folder TTL.
    pub async fn find_folder(&self, name: &str) -> Result<Option<FolderRef>, NotesError> {
        let key = folder_key(name);
        if let Some(cached) = self.cache.lock().await.get(&key) {
            if let Ok(folder) = serde_json::from_value::<FolderRef>(cached) {
                debug!(name, folder_id = %folder.id, "Folder lookup served from cache");
                return Ok(Some(folder));
            }
        }

        let local = {
            let registry = self.registry.lock().await;
            registry.find_folder_by_name(name).map(FolderRef::from)
        };
        let found = match local {
            Some(folder) => Some(folder),
            None => {
                let hits = self
                    .api
                    .search_notes(name, RemoteKind::Folder, TITLE_SEARCH_LIMIT)
                    .await
                    .map_err(|e| failed("find_folder", name, e))?;
                hits.into_iter()
                    .find(|h| same_title(&h.title, name))
                    .map(|h| FolderRef {
                        id: h.id,
                        name: h.title,
                        parent_id: h.parent_note_id,
                    })
            }
        };

        match &found {
            Some(folder) => self.cache_folder(folder).await,
            None => debug!(name, "No folder with that name"),
        }
        Ok(found)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Map a registry id, a title or a remote id to a note id.
    ///
    /// Unknown keys are searched remotely; an exact title match wins, and
    /// with `fuzzy` the first hit is accepted otherwise. A key that matches
    /// nothing but looks like an id is passed through as a remote id.
    /// Registered folders never resolve as notes.
    async fn resolve_note(
        &self,
        registry: &RegistryStore,
        id_or_title: &str,
        fuzzy: bool,
    ) -> Result<String, NotesError> {
        let key = id_or_title.trim();
        if key.is_empty() {
            return Err(NotesError::InvalidInput("note id or title must not be empty".into()));
        }
        if registry.get_folder(key).is_some() {
            return Err(NotesError::InvalidInput(format!(
                "{} is a folder, use the folder operations",
                key
            )));
        }
        if registry.get_note(key).is_some() {
            return Ok(key.to_string());
        }
        if let Some(note) = registry.find_note_by_title(key) {
            debug!(title = key, note_id = %note.id, "Resolved note from registry title");
            return Ok(note.id.clone());
        }

        let hits = self
            .api
            .search_notes(key, RemoteKind::Note, TITLE_SEARCH_LIMIT)
            .await
            .map_err(|e| failed("resolve_note", key, e))?;
        let hits: Vec<&SearchHit> = hits
            .iter()
            .filter(|h| registry.get_folder(&h.id).is_none())
            .collect();
        if let Some(hit) = hits.iter().find(|h| same_title(&h.title, key)) {
            debug!(title = key, note_id = %hit.id, "Resolved note from exact remote title");
            return Ok(hit.id.clone());
        }
        if fuzzy {
            if let Some(hit) = hits.first() {
                debug!(title = key, note_id = %hit.id, "Resolved note from best remote match");
                return Ok(hit.id.clone());
            }
        }
        if !key.contains(char::is_whitespace) {
            return Ok(key.to_string());
        }
        Err(NotesError::NoteNotFound(key.to_string()))
    }

    /// Cached note, or a fresh remote copy that is then cached
    async fn fetch_note(&self, id: &str) -> Result<RemoteNote, NotesError> {
        let key = note_key(id);
        if let Some(cached) = self.cache.lock().await.get(&key) {
            if let Ok(note) = serde_json::from_value::<RemoteNote>(cached) {
                debug!(note_id = %id, "Note served from cache");
                return Ok(note);
            }
        }

        let note = self.api.get_note(id).await.map_err(|e| {
            if e.is_not_found() {
                NotesError::NoteNotFound(id.to_string())
            } else {
                failed("get_note", id, e).into()
            }
        })?;
        if let Ok(value) = serde_json::to_value(&note) {
            self.cache.lock().await.set(key, value, self.note_ttl);
        }
        Ok(note)
    }

    /// Current body for append mode; falls back to the registry copy
    async fn existing_body(&self, id: &str, local: Option<&NoteRecord>) -> String {
        match self.fetch_note(id).await {
            Ok(note) => note.body(),
            Err(e) => {
                warn!(note_id = %id, error = %e, "Could not fetch existing content for append");
                local.map(|n| n.content.clone()).unwrap_or_default()
            }
        }
    }

    /// Remote delete where "already absent" counts as success
    async fn delete_remote(&self, id: &str) -> Result<(), NotesError> {
        match self.api.delete_note(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(id, "Remote entry already absent, treating as deleted");
                Ok(())
            }
            Err(e) => Err(failed("delete", id, e).into()),
        }
    }

    async fn cache_record(&self, record: &NoteRecord) {
        let note = RemoteNote {
            id: record.id.clone(),
            title: record.title.clone(),
            markdown: Some(record.content.clone()),
            parent_note_id: record.parent_id.clone(),
            ..RemoteNote::default()
        };
        if let Ok(value) = serde_json::to_value(&note) {
            self.cache
                .lock()
                .await
                .set(note_key(&record.id), value, self.note_ttl);
        }
    }

    async fn cache_folder(&self, folder: &FolderRef) {
        if let Ok(value) = serde_json::to_value(folder) {
            self.cache
                .lock()
                .await
                .set(folder_key(&folder.name), value, self.folder_ttl);
        }
    }

    async fn announce_removals(&self, removals: Vec<Removal>) {
        {
            let mut cache = self.cache.lock().await;
            for removal in &removals {
                cache.remove(&removal.cache_key);
            }
        }
        for removal in removals {
            self.emit_deleted(removal.entity_type, &removal.id, removal.parent_id);
        }
    }
}

impl From<&FolderRecord> for FolderRef {
    fn from(record: &FolderRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            parent_id: record.parent_id.clone(),
        }
    }
}

fn same_title(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Log a failed remote step with its context and hand the error back
fn failed<E: Display>(operation: &str, target: &str, err: E) -> E {
    error!(operation, target, error = %err, "Remote operation failed");
    err
}

fn partially_applied(operation: &'static str, id: &str, source: RegistryError) -> NotesError {
    error!(operation, id, error = %source, "Remote change applied but local registry was not updated");
    NotesError::PartiallyApplied {
        operation,
        id: id.to_string(),
        source,
    }
}

/// Save the registry after a confirmed remote mutation
fn persist(registry: &RegistryStore, operation: &'static str, id: &str) -> Result<(), NotesError> {
    registry
        .save()
        .map_err(|source| partially_applied(operation, id, source))
}

//! JSON-backed registry store

use super::models::*;
use crate::error::RegistryError;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default registry file name
pub const DEFAULT_REGISTRY_FILE: &str = "slite_registry.json";

/// Local mirror of remote notes and folders
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    doc: RegistryDocument,
}

impl RegistryStore {
    /// Load the registry at `path`, starting empty when the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let doc = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => RegistryDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No registry file yet, starting empty");
                RegistryDocument::default()
            }
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        let store = Self { path, doc };
        if let Err(e) = store.check_invariants() {
            warn!(path = %store.path.display(), error = %e, "Registry loaded with inconsistencies");
        }
        debug!(
            notes = store.doc.notes.len(),
            folders = store.doc.folders.len(),
            "Registry loaded"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &RegistryDocument {
        &self.doc
    }

    /// Write the whole document, replacing the file atomically
    pub fn save(&self) -> Result<(), RegistryError> {
        let bytes = serde_json::to_vec_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| RegistryError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "Registry saved");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn insert_note(&mut self, note: NoteRecord) -> Result<(), RegistryError> {
        self.ensure_new_id(&note.id)?;
        if let Some(parent) = &note.parent_id {
            self.ensure_folder(parent)?;
        }
        self.link(note.parent_id.as_deref(), &note.id);
        self.doc.notes.insert(note.id.clone(), note);
        Ok(())
    }

    pub fn insert_folder(&mut self, folder: FolderRecord) -> Result<(), RegistryError> {
        self.ensure_new_id(&folder.id)?;
        if let Some(parent) = &folder.parent_id {
            self.ensure_folder(parent)?;
            if self.ancestors(parent).iter().any(|a| a == &folder.id) {
                return Err(RegistryError::Cycle {
                    folder_id: folder.id.clone(),
                    parent_id: parent.clone(),
                });
            }
        }
        self.link(folder.parent_id.as_deref(), &folder.id);
        self.doc.folder_hierarchy.entry(folder.id.clone()).or_default();
        self.doc.folders.insert(folder.id.clone(), folder);
        Ok(())
    }

    /// Replace title and/or content of a note
    pub fn update_note(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<&NoteRecord, RegistryError> {
        let note = self
            .doc
            .notes
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownNote(id.to_string()))?;
        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        note.updated_at = Utc::now();
        Ok(note)
    }

    pub fn update_folder(
        &mut self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<&FolderRecord, RegistryError> {
        let folder = self
            .doc
            .folders
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownFolder(id.to_string()))?;
        if let Some(name) = name {
            folder.name = name;
        }
        if let Some(description) = description {
            folder.description = description;
        }
        folder.updated_at = Utc::now();
        Ok(folder)
    }

    /// Whether `move_folder(id, new_parent)` would be accepted
    pub fn check_move(&self, id: &str, new_parent: Option<&str>) -> Result<(), RegistryError> {
        self.ensure_folder(id)?;
        if let Some(parent) = new_parent {
            self.ensure_folder(parent)?;
            if parent == id || self.ancestors(parent).iter().any(|a| a == id) {
                return Err(RegistryError::Cycle {
                    folder_id: id.to_string(),
                    parent_id: parent.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Re-parent a folder; `None` moves it to the root
    pub fn move_folder(&mut self, id: &str, new_parent: Option<&str>) -> Result<(), RegistryError> {
        self.check_move(id, new_parent)?;

        let old_parent = self.doc.folders.get(id).and_then(|f| f.parent_id.clone());
        self.unlink(old_parent.as_deref(), id);
        self.link(new_parent, id);
        if let Some(folder) = self.doc.folders.get_mut(id) {
            folder.parent_id = new_parent.map(str::to_string);
            folder.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Forget a note and its link from the parent folder
    pub fn remove_note(&mut self, id: &str) -> Option<NoteRecord> {
        let note = self.doc.notes.remove(id)?;
        self.unlink(note.parent_id.as_deref(), id);
        Some(note)
    }

    /// Forget a folder and its link from the parent folder.
    ///
    /// Children still registered are kept and moved to the root.
    pub fn remove_folder(&mut self, id: &str) -> Option<FolderRecord> {
        let folder = self.doc.folders.remove(id)?;
        self.unlink(folder.parent_id.as_deref(), id);

        let orphans = self.doc.folder_hierarchy.remove(id).unwrap_or_default();
        for child in orphans {
            if let Some(note) = self.doc.notes.get_mut(&child) {
                note.parent_id = None;
            } else if let Some(sub) = self.doc.folders.get_mut(&child) {
                sub.parent_id = None;
            }
        }
        Some(folder)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_note(&self, id: &str) -> Option<&NoteRecord> {
        self.doc.notes.get(id)
    }

    pub fn get_folder(&self, id: &str) -> Option<&FolderRecord> {
        self.doc.folders.get(id)
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteRecord> {
        self.doc.notes.values()
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderRecord> {
        self.doc.folders.values()
    }

    /// Direct children of a folder, in insertion order
    pub fn children(&self, folder_id: &str) -> &[String] {
        self.doc
            .folder_hierarchy
            .get(folder_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Everything below `folder_id`, leaves before their parents.
    ///
    /// The folder itself is not included.
    pub fn collect_descendants(&self, folder_id: &str) -> Result<Vec<RegistryEntry>, RegistryError> {
        self.ensure_folder(folder_id)?;
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(folder_id.to_string());
        self.collect_into(folder_id, &mut out, &mut visited)?;
        Ok(out)
    }

    fn collect_into(
        &self,
        folder_id: &str,
        out: &mut Vec<RegistryEntry>,
        visited: &mut HashSet<String>,
    ) -> Result<(), RegistryError> {
        for child in self.children(folder_id) {
            if self.doc.folders.contains_key(child) {
                if !visited.insert(child.clone()) {
                    return Err(RegistryError::Cycle {
                        folder_id: child.clone(),
                        parent_id: folder_id.to_string(),
                    });
                }
                self.collect_into(child, out, visited)?;
                out.push(RegistryEntry::Folder(child.clone()));
            } else if self.doc.notes.contains_key(child) {
                out.push(RegistryEntry::Note(child.clone()));
            }
        }
        Ok(())
    }

    /// Case-insensitive substring match on title, project and department.
    ///
    /// An empty query matches every note.
    pub fn search_notes(&self, query: &str) -> Vec<&NoteRecord> {
        let query = query.trim().to_lowercase();
        self.doc
            .notes
            .values()
            .filter(|note| {
                query.is_empty()
                    || [
                        Some(note.title.as_str()),
                        note.metadata_str("project"),
                        note.metadata_str("department"),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Folder whose name equals `name`, ignoring case
    pub fn find_folder_by_name(&self, name: &str) -> Option<&FolderRecord> {
        let name = name.trim().to_lowercase();
        self.doc
            .folders
            .values()
            .find(|f| f.name.to_lowercase() == name)
    }

    /// Note whose title equals `title`, ignoring case
    pub fn find_note_by_title(&self, title: &str) -> Option<&NoteRecord> {
        let title = title.trim().to_lowercase();
        self.doc
            .notes
            .values()
            .find(|n| n.title.to_lowercase() == title)
    }

    /// Verify hierarchy references and parent chains
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        for (folder_id, children) in &self.doc.folder_hierarchy {
            if !self.doc.folders.contains_key(folder_id) {
                return Err(RegistryError::UnknownFolder(folder_id.clone()));
            }
            let mut seen = HashSet::new();
            for child in children {
                if !seen.insert(child) {
                    return Err(RegistryError::DuplicateId(child.clone()));
                }
                if !self.doc.notes.contains_key(child) && !self.doc.folders.contains_key(child) {
                    return Err(RegistryError::UnknownNote(child.clone()));
                }
            }
        }

        for id in self.doc.folders.keys() {
            if self.doc.notes.contains_key(id) {
                return Err(RegistryError::DuplicateId(id.clone()));
            }
            let mut seen = HashSet::new();
            let mut current = Some(id.as_str());
            while let Some(folder_id) = current {
                if !seen.insert(folder_id) {
                    return Err(RegistryError::Cycle {
                        folder_id: id.clone(),
                        parent_id: folder_id.to_string(),
                    });
                }
                current = self
                    .doc
                    .folders
                    .get(folder_id)
                    .and_then(|f| f.parent_id.as_deref());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Parent chain of a folder, nearest first, stopping on a repeat
    fn ancestors(&self, folder_id: &str) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = self
            .doc
            .folders
            .get(folder_id)
            .and_then(|f| f.parent_id.clone());
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            current = self.doc.folders.get(&id).and_then(|f| f.parent_id.clone());
            chain.push(id);
        }
        chain
    }

    fn ensure_new_id(&self, id: &str) -> Result<(), RegistryError> {
        if self.doc.notes.contains_key(id) || self.doc.folders.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    fn ensure_folder(&self, id: &str) -> Result<(), RegistryError> {
        if !self.doc.folders.contains_key(id) {
            return Err(RegistryError::UnknownFolder(id.to_string()));
        }
        Ok(())
    }

    fn link(&mut self, parent: Option<&str>, child: &str) {
        if let Some(parent) = parent {
            let children = self.doc.folder_hierarchy.entry(parent.to_string()).or_default();
            if !children.iter().any(|c| c == child) {
                children.push(child.to_string());
            }
        }
    }

    fn unlink(&mut self, parent: Option<&str>, child: &str) {
        if let Some(children) = parent.and_then(|p| self.doc.folder_hierarchy.get_mut(p)) {
            children.retain(|c| c != child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, RegistryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join(DEFAULT_REGISTRY_FILE)).unwrap();
        (dir, store)
    }

    fn tree(store: &mut RegistryStore) {
        // f1 { n1, f2 { n2, n3 }, n4 }
        store.insert_folder(FolderRecord::new("f1", "Projects", "")).unwrap();
        store
            .insert_note(NoteRecord::new("n1", "Roadmap", "").with_parent(Some("f1".into())))
            .unwrap();
        store
            .insert_folder(FolderRecord::new("f2", "Q3", "").with_parent(Some("f1".into())))
            .unwrap();
        store
            .insert_note(NoteRecord::new("n2", "Kickoff", "").with_parent(Some("f2".into())))
            .unwrap();
        store
            .insert_note(NoteRecord::new("n3", "Retro", "").with_parent(Some("f2".into())))
            .unwrap();
        store
            .insert_note(NoteRecord::new("n4", "Budget", "").with_parent(Some("f1".into())))
            .unwrap();
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.document().notes.is_empty());
        assert!(store.document().folders.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (dir, mut store) = store();
        tree(&mut store);
        store.save().unwrap();

        let reloaded = RegistryStore::open(dir.path().join(DEFAULT_REGISTRY_FILE)).unwrap();
        assert_eq!(reloaded.document(), store.document());
        assert_eq!(reloaded.children("f1"), &["n1", "f2", "n4"]);
        assert!(!dir.path().join("slite_registry.json.tmp").exists());
    }

    #[test]
    fn test_file_layout() {
        let (dir, mut store) = store();
        tree(&mut store);
        store.save().unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(DEFAULT_REGISTRY_FILE)).unwrap())
                .unwrap();
        assert_eq!(raw["folder_hierarchy"]["f2"], json!(["n2", "n3"]));
        assert_eq!(raw["notes"]["n2"]["parent_id"], json!("f2"));
        assert_eq!(raw["folders"]["f1"]["name"], json!("Projects"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(RegistryStore::open(&path), Err(RegistryError::Json(_))));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("missing").join("registry.json")).unwrap();
        assert!(matches!(store.save(), Err(RegistryError::Io { .. })));
    }

    #[test]
    fn test_insert_rejects_duplicates_and_unknown_parents() {
        let (_dir, mut store) = store();
        tree(&mut store);
        assert!(matches!(
            store.insert_note(NoteRecord::new("n1", "Again", "")),
            Err(RegistryError::DuplicateId(_))
        ));
        assert!(matches!(
            store.insert_note(NoteRecord::new("f1", "Clash", "")),
            Err(RegistryError::DuplicateId(_))
        ));
        assert!(matches!(
            store.insert_note(NoteRecord::new("n9", "Lost", "").with_parent(Some("f9".into()))),
            Err(RegistryError::UnknownFolder(_))
        ));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_collect_descendants_is_leaves_first() {
        let (_dir, mut store) = store();
        tree(&mut store);
        let order: Vec<String> = store
            .collect_descendants("f1")
            .unwrap()
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(order, vec!["n1", "n2", "n3", "f2", "n4"]);
        assert!(store.collect_descendants("f2").unwrap().len() == 2);
        assert!(matches!(
            store.collect_descendants("nope"),
            Err(RegistryError::UnknownFolder(_))
        ));
    }

    #[test]
    fn test_cascade_removal_keeps_invariants() {
        let (_dir, mut store) = store();
        tree(&mut store);
        store
            .insert_note(NoteRecord::new("n5", "Loose", ""))
            .unwrap();

        for entry in store.collect_descendants("f1").unwrap() {
            match entry {
                RegistryEntry::Note(id) => assert!(store.remove_note(&id).is_some()),
                RegistryEntry::Folder(id) => assert!(store.remove_folder(&id).is_some()),
            }
            store.check_invariants().unwrap();
        }
        store.remove_folder("f1").unwrap();
        store.check_invariants().unwrap();

        assert!(store.document().folders.is_empty());
        assert_eq!(store.notes().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["n5"]);
        assert!(store.document().folder_hierarchy.is_empty());
    }

    #[test]
    fn test_remove_folder_with_children_moves_them_to_root() {
        let (_dir, mut store) = store();
        tree(&mut store);
        store.remove_folder("f2").unwrap();
        assert_eq!(store.get_note("n2").unwrap().parent_id, None);
        assert_eq!(store.children("f1"), &["n1", "n4"]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_move_folder_refuses_cycles() {
        let (_dir, mut store) = store();
        tree(&mut store);
        store
            .insert_folder(FolderRecord::new("f3", "Deep", "").with_parent(Some("f2".into())))
            .unwrap();

        assert!(matches!(
            store.move_folder("f1", Some("f3")),
            Err(RegistryError::Cycle { .. })
        ));
        assert!(matches!(
            store.move_folder("f2", Some("f2")),
            Err(RegistryError::Cycle { .. })
        ));

        store.move_folder("f3", None).unwrap();
        assert_eq!(store.get_folder("f3").unwrap().parent_id, None);
        assert_eq!(store.children("f2"), &["n2", "n3"]);

        store.move_folder("f1", Some("f3")).unwrap();
        assert_eq!(store.children("f3"), &["f1"]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_update_note_and_folder() {
        let (_dir, mut store) = store();
        tree(&mut store);
        let before = store.get_note("n1").unwrap().updated_at;
        let note = store
            .update_note("n1", None, Some("new body".into()))
            .unwrap();
        assert_eq!(note.title, "Roadmap");
        assert_eq!(note.content, "new body");
        assert!(note.updated_at >= before);

        store.update_folder("f2", Some("Q4".into()), None).unwrap();
        assert_eq!(store.find_folder_by_name("q4").unwrap().id, "f2");
        assert!(matches!(
            store.update_note("n9", None, None),
            Err(RegistryError::UnknownNote(_))
        ));
    }

    #[test]
    fn test_search_matches_title_project_and_department() {
        let (_dir, mut store) = store();
        let mut meta = serde_json::Map::new();
        meta.insert("project".into(), json!("Apollo"));
        meta.insert("department".into(), json!("Planning"));
        store
            .insert_note(NoteRecord::new("n1", "Weekly sync", "").with_metadata(meta))
            .unwrap();
        store
            .insert_note(NoteRecord::new("n2", "Sprint planning", ""))
            .unwrap();
        store
            .insert_note(NoteRecord::new("n3", "Retro", ""))
            .unwrap();

        let mut hits: Vec<&str> = store
            .search_notes("PLANNING")
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["n1", "n2"]);
        assert_eq!(store.search_notes("apollo").len(), 1);
        assert!(store.search_notes("zzz").is_empty());
        assert_eq!(store.search_notes("").len(), 3);
    }

    #[test]
    fn test_find_note_by_title_ignores_case() {
        let (_dir, mut store) = store();
        tree(&mut store);
        assert_eq!(store.find_note_by_title("  kickoff ").unwrap().id, "n2");
        assert!(store.find_note_by_title("Kick").is_none());
    }

    #[test]
    fn test_check_invariants_detects_dangling_child() {
        let (_dir, mut store) = store();
        tree(&mut store);
        store.doc.folder_hierarchy.get_mut("f2").unwrap().push("ghost".into());
        assert!(matches!(
            store.check_invariants(),
            Err(RegistryError::UnknownNote(id)) if id == "ghost"
        ));
    }
}

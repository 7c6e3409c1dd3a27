//! TTL cache persisted as JSON
//!
//! Entries expire lazily: a read after `timestamp + ttl` evicts the entry and
//! reports a miss. The file is rewritten after every mutation and is advisory
//! only, so write failures are logged and otherwise ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Default cache file name
pub const DEFAULT_CACHE_FILE: &str = "slite_cache.json";
/// Lifetime of a cached note
pub const NOTE_TTL: Duration = Duration::from_secs(300);
/// Lifetime of a cached folder lookup
pub const FOLDER_TTL: Duration = Duration::from_secs(600);

/// A cached value with its write time (seconds since the epoch) and lifetime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: f64,
    /// Lifetime in seconds
    pub ttl: f64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: f64) -> bool {
        now - self.timestamp < self.ttl
    }
}

/// Cache key of a note body
pub fn note_key(id: &str) -> String {
    format!("note:{}", id)
}

/// Cache key of a folder lookup by name
pub fn folder_key(name: &str) -> String {
    format!("folder:{}", name.trim().to_lowercase())
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct TtlCache {
    path: Option<PathBuf>,
    entries: HashMap<String, CacheEntry>,
}

impl TtlCache {
    /// Cache that never touches the disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file if present. An unreadable file starts an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache file");
                HashMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "Cache loaded");
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh value for `key`; an expired entry is evicted
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(now_secs()) {
            return Some(entry.data.clone());
        }
        debug!(key, "Cache entry expired");
        self.entries.remove(key);
        self.persist();
        None
    }

    pub fn set(&mut self, key: impl Into<String>, data: Value, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                timestamp: now_secs(),
                ttl: ttl.as_secs_f64(),
            },
        );
        self.persist();
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.remove(key)?;
        self.persist();
        Some(entry.data)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_vec(&self.entries)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(path, bytes));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to write cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = TtlCache::in_memory();
        cache.set("k", json!({"v": 1}), Duration::from_secs(300));
        assert_eq!(cache.get("k"), Some(json!({"v": 1})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_miss_after_ttl_evicts() {
        let mut cache = TtlCache::in_memory();
        cache.set("k", json!("v"), Duration::from_secs(1));
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_is_always_a_miss() {
        let mut cache = TtlCache::in_memory();
        cache.set("k", json!(1), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_entry_freshness_boundary() {
        let entry = CacheEntry {
            data: Value::Null,
            timestamp: 100.0,
            ttl: 10.0,
        };
        assert!(entry.is_fresh(109.9));
        assert!(!entry.is_fresh(110.0));
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CACHE_FILE);

        let mut cache = TtlCache::open(&path);
        cache.set(note_key("n1"), json!({"title": "Plan"}), NOTE_TTL);
        cache.set(folder_key("Projects"), json!({"id": "f1"}), FOLDER_TTL);

        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["note:n1"]["ttl"], json!(300.0));
        assert!(raw["folder:projects"]["timestamp"].as_f64().unwrap() > 0.0);

        let mut reopened = TtlCache::open(&path);
        assert_eq!(reopened.get("note:n1"), Some(json!({"title": "Plan"})));
        assert_eq!(reopened.remove(&folder_key("Projects")), Some(json!({"id": "f1"})));
        assert_eq!(TtlCache::open(&path).len(), 1);
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(TtlCache::open(&path).is_empty());
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = TtlCache::open(dir.path().join("missing").join("cache.json"));
        cache.set("k", json!(1), NOTE_TTL);
        assert_eq!(cache.get("k"), Some(json!(1)));
        assert_eq!(cache.remove("k"), Some(json!(1)));
        cache.clear();
    }
}

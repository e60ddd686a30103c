//! File-backed seen-message store.
//!
//! Keys are kept in a [`MemoryStore`] and written to a JSON array of
//! encoded keys (`["gmail-18c2f0a9d1", "outlook-AAMkAGI2"]`) when the
//! tracker is flushed at the end of a scan, so dedup survives restarts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use invitescan_core::{MemoryStore, MessageKey, SeenStore};
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};

/// A [`SeenStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    keys: MemoryStore,
    dirty: AtomicBool,
}

impl JsonFileStore {
    /// Opens the store, loading any keys already on disk.
    ///
    /// A missing file is an empty store. Entries that do not decode as
    /// message keys are dropped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();
        let keys = if path.exists() {
            load(&path)?
        } else {
            debug!(path = %path.display(), "seen store does not exist yet");
            Vec::new()
        };

        debug!(path = %path.display(), count = keys.len(), "opened seen store");
        Ok(Self {
            path,
            keys: MemoryStore::with_keys(keys),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current key set to disk.
    pub fn persist(&self) -> ServerResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut encoded: Vec<String> = self.keys.snapshot().iter().map(|k| k.to_string()).collect();
        encoded.sort();

        let json = serde_json::to_string_pretty(&encoded)
            .map_err(|e| ServerError::store(&self.path, e.to_string()))?;

        // Atomic replace via a sibling temp file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load(path: &Path) -> ServerResult<Vec<MessageKey>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let encoded: Vec<String> = serde_json::from_str(&content)
        .map_err(|e| ServerError::store(path, format!("invalid JSON: {}", e)))?;

    Ok(encoded
        .into_iter()
        .filter_map(|raw| match raw.parse::<MessageKey>() {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(entry = %raw, error = %e, "dropping unreadable seen key");
                None
            }
        })
        .collect())
}

impl SeenStore for JsonFileStore {
    fn contains(&self, key: &MessageKey) -> bool {
        self.keys.contains(key)
    }

    fn insert(&self, key: MessageKey) {
        if self.keys.contains(&key) {
            return;
        }
        self.keys.insert(key);
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn clear(&self) {
        self.keys.clear();
        self.dirty.store(false, Ordering::SeqCst);
        if let Err(e) = self.persist() {
            warn!(path = %self.path.display(), error = %e, "failed to persist seen keys");
        }
    }

    fn flush(&self) {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        // The in-memory set stays authoritative for this process.
        if let Err(e) = self.persist() {
            self.dirty.store(true, Ordering::SeqCst);
            warn!(path = %self.path.display(), error = %e, "failed to persist seen keys");
        } else {
            debug!(path = %self.path.display(), count = self.keys.len(), "persisted seen keys");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invitescan_core::{DedupTracker, ProviderId};
    use tempfile::TempDir;

    fn key(provider: ProviderId, id: &str) -> MessageKey {
        MessageKey::new(provider, id)
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("seen.json")).unwrap();
        assert_eq!(store.len(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn keys_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("seen.json");

        let tracker = DedupTracker::with_store(JsonFileStore::open(&path).unwrap());
        tracker.mark_seen(key(ProviderId::Gmail, "18c2f0a9d1"));
        tracker.mark_seen(key(ProviderId::Outlook, "AAMk-AGI2"));
        tracker.flush();
        drop(tracker);

        let reopened = DedupTracker::with_store(JsonFileStore::open(&path).unwrap());
        assert_eq!(reopened.len(), 2);
        assert!(reopened.has(&key(ProviderId::Gmail, "18c2f0a9d1")));
        assert!(reopened.has(&key(ProviderId::Outlook, "AAMk-AGI2")));
    }

    #[test]
    fn file_is_a_sorted_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(key(ProviderId::Outlook, "b"));
        store.insert(key(ProviderId::Gmail, "a"));
        store.flush();

        let content: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content, vec!["gmail-a", "outlook-b"]);
    }

    #[test]
    fn unreadable_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, r#"["gmail-1", "yahoo-2", "nodash"]"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains(&key(ProviderId::Gmail, "1")));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, ServerError::Store { .. }));
    }

    #[test]
    fn clear_empties_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(key(ProviderId::Gmail, "1"));
        store.clear();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 0);
    }

    #[test]
    fn inserts_are_written_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(key(ProviderId::Gmail, "1"));
        store.insert(key(ProviderId::Gmail, "2"));
        assert!(!path.exists());

        store.flush();
        assert_eq!(JsonFileStore::open(&path).unwrap().len(), 2);

        fs::remove_file(&path).unwrap();
        store.flush();
        assert!(!path.exists(), "clean store is not rewritten");

        store.insert(key(ProviderId::Gmail, "1"));
        store.flush();
        assert!(!path.exists(), "known key does not dirty the store");
    }
}

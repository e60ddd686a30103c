//! Seen-message tracking.
//!
//! A [`DedupTracker`] remembers which messages already produced an invite so
//! later scans skip them before any detail fetch. Keys are never evicted;
//! the set only grows for the lifetime of the backing store.
//!
//! The backing store is pluggable through [`SeenStore`]. [`MemoryStore`] is
//! the default and is lost on restart; persistent stores live with the
//! service that owns the tracker.

use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;

use tracing::trace;

use crate::key::MessageKey;

/// Backing storage for seen message keys.
///
/// Implementations use interior mutability so one tracker can be shared
/// across provider adapters behind an `Arc`.
pub trait SeenStore: Send + Sync {
    /// Returns true if the key has been recorded.
    fn contains(&self, key: &MessageKey) -> bool;

    /// Records a key. Recording the same key twice is a no-op.
    fn insert(&self, key: MessageKey);

    /// Number of recorded keys.
    fn len(&self) -> usize;

    /// Forgets every key.
    fn clear(&self);

    /// Persists keys recorded since the last flush. Stores without durable
    /// state do nothing.
    fn flush(&self) {}
}

/// In-memory [`SeenStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: RwLock<HashSet<MessageKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with keys.
    pub fn with_keys(keys: impl IntoIterator<Item = MessageKey>) -> Self {
        Self {
            keys: RwLock::new(keys.into_iter().collect()),
        }
    }

    /// Returns a copy of the recorded keys.
    pub fn snapshot(&self) -> Vec<MessageKey> {
        self.keys.read().unwrap().iter().cloned().collect()
    }
}

impl SeenStore for MemoryStore {
    fn contains(&self, key: &MessageKey) -> bool {
        self.keys.read().unwrap().contains(key)
    }

    fn insert(&self, key: MessageKey) {
        self.keys.write().unwrap().insert(key);
    }

    fn len(&self) -> usize {
        self.keys.read().unwrap().len()
    }

    fn clear(&self) {
        self.keys.write().unwrap().clear();
    }
}

/// Tracks which messages have already yielded an invite.
///
/// `has` followed by `mark_seen` is not atomic; callers running overlapping
/// scans against one tracker must serialize them.
pub struct DedupTracker {
    store: Box<dyn SeenStore>,
}

impl DedupTracker {
    /// Creates an empty tracker backed by memory.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Creates a tracker over the given store.
    pub fn with_store(store: impl SeenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Returns true if the message was already processed.
    pub fn has(&self, key: &MessageKey) -> bool {
        self.store.contains(key)
    }

    /// Marks a message as processed.
    pub fn mark_seen(&self, key: MessageKey) {
        trace!(key = %key, "marking message seen");
        self.store.insert(key);
    }

    /// Number of messages marked seen.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every seen message. Intended for tests and manual resets.
    pub fn reset(&self) {
        self.store.clear();
    }

    /// Persists the seen set. Called once at the end of a scan.
    pub fn flush(&self) {
        self.store.flush();
    }
}

impl Default for DedupTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DedupTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupTracker")
            .field("seen", &self.len())
            .finish()
    }
}

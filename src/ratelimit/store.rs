//! Concurrent storage for per-key request history.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use super::class::ActionClass;
use super::key::LimiterKey;
use super::timestamps::TimestampLog;

/// Shared handle to one key's history. Lock it to read or mutate.
pub type LogHandle = Arc<Mutex<TimestampLog>>;

/// Map from `(identifier, class)` to that key's timestamp log.
///
/// The map is sharded, and each log sits behind its own mutex, so callers on
/// different keys never wait on each other while calls on the same key are
/// serialized. Map shard locks are only ever held briefly and always taken
/// before a log lock, never after.
#[derive(Default)]
pub struct CounterStore {
    entries: DashMap<LimiterKey, LogHandle>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the log for a key, creating an empty one if none exists.
    pub fn get_or_create(&self, identifier: &str, class: ActionClass) -> LogHandle {
        let entry = self
            .entries
            .entry(LimiterKey::new(identifier, class))
            .or_insert_with(|| Arc::new(Mutex::new(TimestampLog::new())));
        Arc::clone(entry.value())
    }

    /// Delete a key's log. Returns whether anything was removed.
    pub fn remove(&self, identifier: &str, class: ActionClass) -> bool {
        match self.entries.remove(&LimiterKey::new(identifier, class)) {
            Some((_, handle)) => {
                handle.lock().detach();
                true
            }
            None => false,
        }
    }

    /// Delete a key's log if `predicate` approves it.
    ///
    /// The predicate runs while the key's shard is locked, so nobody can
    /// fetch the log between the decision and the removal. A predicate that
    /// returns `true` must detach the log it was shown.
    pub fn remove_if<F>(&self, key: &LimiterKey, predicate: F) -> bool
    where
        F: FnOnce(&LogHandle) -> bool,
    {
        self.entries
            .remove_if(key, |_, handle| predicate(handle))
            .is_some()
    }

    /// Visit every entry.
    ///
    /// Shards are read-locked one at a time while visiting, so `f` must not
    /// call back into the store. Entries changed concurrently may or may not
    /// be observed.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&LimiterKey, &LogHandle),
    {
        for entry in self.entries.iter() {
            f(entry.key(), entry.value());
        }
    }

    /// Snapshot of the keys currently stored.
    pub fn keys(&self) -> Vec<LimiterKey> {
        let mut keys = Vec::with_capacity(self.entries.len());
        self.for_each(|key, _| keys.push(key.clone()));
        keys
    }

    /// Get the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

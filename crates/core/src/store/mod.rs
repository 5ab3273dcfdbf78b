//! In-process snapshot store keyed by resource and version tag.
//!
//! This module provides the cache the proxy diffs against. It supports:
//!
//! - Content-addressed keys using SHA-256 over (resource, tag)
//! - Last-write-wins `put` and non-failing `get`
//! - Optional eviction by entry count (LRU) and by age
//!
//! The store lives for the process lifetime and starts empty. It is shared
//! between request handlers through an `Arc`, never through a global.

pub mod eviction;
pub mod hash;
pub mod snapshot;

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

pub use eviction::EvictionPolicy;
pub use hash::compute_snapshot_key;
pub use snapshot::Snapshot;

#[derive(Debug)]
struct Inner {
    lru: LruCache<String, Snapshot>,
    /// (stored_at, key) for every entry, oldest first.
    by_age: BTreeSet<(DateTime<Utc>, String)>,
}

impl Inner {
    fn new(policy: &EvictionPolicy) -> Self {
        let lru = match policy.max_entries {
            Some(max) => LruCache::new(NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN)),
            None => LruCache::unbounded(),
        };
        Self { lru, by_age: BTreeSet::new() }
    }

    /// Insert a snapshot; returns the entry displaced by capacity, if any.
    fn insert(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        let key = snapshot.key.clone();
        let stored_at = snapshot.stored_at;

        let displaced = self.lru.push(key.clone(), snapshot).map(|(old_key, old)| {
            self.by_age.remove(&(old.stored_at, old_key));
            old
        });
        self.by_age.insert((stored_at, key.clone()));

        displaced.filter(|old| old.key != key)
    }

    fn remove(&mut self, key: &str) -> Option<Snapshot> {
        let snapshot = self.lru.pop(key)?;
        self.by_age.remove(&(snapshot.stored_at, snapshot.key.clone()));
        Some(snapshot)
    }

    fn clear(&mut self) {
        self.lru.clear();
        self.by_age.clear();
    }
}

/// Mapping from (resource, version tag) to the JSON document seen at that version.
///
/// Every operation takes a single internal lock, so a `put` or `get` on one
/// key is atomic. There are no cross-key transactions.
#[derive(Debug)]
pub struct VersionStore {
    inner: Mutex<Inner>,
    policy: EvictionPolicy,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::with_policy(EvictionPolicy::unbounded())
    }
}

impl VersionStore {
    /// Create an empty store that never evicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given eviction policy.
    pub fn with_policy(policy: EvictionPolicy) -> Self {
        Self { inner: Mutex::new(Inner::new(&policy)), policy }
    }

    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }

    /// Store `document` under (resource, tag), replacing any earlier value.
    ///
    /// Expired entries are dropped before the count cap is applied, so the
    /// cap only ever evicts live snapshots once nothing stale is left.
    pub fn put(&self, resource: &str, tag: &str, document: Value) {
        self.put_at(resource, tag, document, Utc::now());
    }

    pub(crate) fn put_at(&self, resource: &str, tag: &str, document: Value, stored_at: DateTime<Utc>) {
        let key = compute_snapshot_key(resource, tag);
        let snapshot = Snapshot {
            key: key.clone(),
            resource: resource.to_string(),
            tag: tag.to_string(),
            document: Arc::new(document),
            stored_at,
        };

        let mut inner = self.lock();
        let expired = eviction::drop_expired(&mut inner, &self.policy, Utc::now());
        let replaced = inner.lru.contains(&key);
        let evicted = inner.insert(snapshot);
        tracing::debug!(resource, tag, replaced, expired, evicted = evicted.is_some(), "stored snapshot");
    }

    /// Look up the document stored under (resource, tag).
    ///
    /// Returns `None` for an empty tag, an unknown key, or an entry older
    /// than the configured maximum age.
    pub fn get(&self, resource: &str, tag: &str) -> Option<Arc<Value>> {
        self.snapshot(resource, tag).map(|s| s.document)
    }

    /// Like [`get`](Self::get), but returns the whole entry.
    pub fn snapshot(&self, resource: &str, tag: &str) -> Option<Snapshot> {
        if tag.is_empty() {
            return None;
        }

        let key = compute_snapshot_key(resource, tag);
        let mut inner = self.lock();
        eviction::drop_expired(&mut inner, &self.policy, Utc::now());
        inner.lru.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every snapshot.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

//! Eviction policy and purge operations.
//!
//! The default policy keeps every snapshot for the life of the process.
//! A count cap evicts the least-recently-used entry when a `put` would
//! exceed it. A maximum age drops stale entries, oldest first, on every
//! store access and from the server's periodic sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Inner, VersionStore};

/// Bounds applied to a [`VersionStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Keep at most this many snapshots.
    pub max_entries: Option<usize>,
    /// Treat snapshots older than this as absent.
    pub max_age: Option<Duration>,
}

impl EvictionPolicy {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub(crate) fn is_expired(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        now.signed_duration_since(stored_at)
            .to_std()
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}

/// Remove every entry older than the policy's maximum age, oldest first.
///
/// Returns the number of removed entries; always 0 without a maximum age.
pub(super) fn drop_expired(inner: &mut Inner, policy: &EvictionPolicy, now: DateTime<Utc>) -> usize {
    if policy.max_age.is_none() {
        return 0;
    }

    let mut dropped = 0;
    while let Some((stored_at, key)) = inner.by_age.first() {
        if !policy.is_expired(*stored_at, now) {
            break;
        }
        let key = key.clone();
        if inner.remove(&key).is_none() {
            // Stale index entry with no snapshot behind it.
            inner.by_age.pop_first();
        }
        dropped += 1;
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped expired snapshots");
    }
    dropped
}

impl VersionStore {
    /// Delete snapshots older than the policy's maximum age.
    ///
    /// Returns the number of deleted entries; always 0 without a maximum age.
    pub fn purge_expired(&self) -> usize {
        drop_expired(&mut self.lock(), &self.policy, Utc::now())
    }
}

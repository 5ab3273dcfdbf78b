//! Stored snapshot entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A JSON document observed at one version of one resource.
///
/// The document is shared, so cloning a snapshot does not copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Content-addressed key, see [`compute_snapshot_key`](super::compute_snapshot_key).
    pub key: String,
    /// Request path and query as received by the proxy.
    pub resource: String,
    /// Upstream entity tag.
    pub tag: String,
    pub document: Arc<Value>,
    pub stored_at: DateTime<Utc>,
}

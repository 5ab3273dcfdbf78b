//! Content-addressed snapshot key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a (resource, version tag) pair.
///
/// Both parts are length-prefixed before hashing, so no two distinct
/// pairs can produce the same input stream.
pub fn compute_snapshot_key(resource: &str, tag: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((resource.len() as u64).to_be_bytes());
    hasher.update(resource.as_bytes());
    hasher.update((tag.len() as u64).to_be_bytes());
    hasher.update(tag.as_bytes());
    hex::encode(hasher.finalize())
}

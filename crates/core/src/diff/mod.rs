//! # JSON Diff/Patch
//!
//! Structural comparison of two JSON documents into an ordered list of
//! RFC 6902 operations, and sequential application of such a list.
//!
//! ## Diff
//! The comparison is a recursive walk over both documents:
//! - Objects: keys only in the old value yield `remove`, keys only in the new
//!   value yield `add`, shared keys recurse.
//! - Arrays: compared position by position. Extra tail elements yield
//!   `add` or `remove`. There is no sequence alignment, so an insertion near
//!   the front of an array shows up as a run of `replace` plus one `add`.
//! - Anything else: `replace` when not deeply equal.
//!
//! ## Ordering
//! For every container pair, keys of the old value are visited last to first
//! (reverse insertion order, descending index), then keys only in the new
//! value first to last. Visiting old array indices in descending order keeps
//! every emitted index valid while the list is applied in sequence.
//!
//! ## Patch
//! [`apply_patch`] replays `add`, `remove` and `replace` against a document.

mod compute;
mod patch;
mod pointer;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use compute::{diff, values_equal};
pub use patch::{PatchError, apply_patch};
pub use pointer::parse_pointer;

/// A single edit addressed by a JSON pointer.
///
/// Serializes as `{"op": "add"|"remove"|"replace", "path": ..., "value": ...}`,
/// with `value` omitted for `remove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => path,
        }
    }

    /// The new value, if this operation carries one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => Some(value),
            PatchOp::Remove { .. } => None,
        }
    }

    /// Operation name as it appears on the wire.
    pub fn op_name(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
        }
    }
}

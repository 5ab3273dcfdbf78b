use serde_json::Value;
use thiserror::Error;

use super::PatchOp;
use super::pointer::parse_pointer;

/// Errors from applying a patch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("invalid pointer: {0:?}")]
    InvalidPointer(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("index {index} out of bounds at {path} (length {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("value at {0} is not a container")]
    NotAContainer(String),
}

/// Apply `ops` in order to a copy of `doc`.
pub fn apply_patch(doc: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    let mut out = doc.clone();
    apply_patch_mut(&mut out, ops)?;
    Ok(out)
}

/// Apply `ops` in order to `doc` in place.
///
/// Stops at the first failing operation; earlier operations stay applied.
fn apply_patch_mut(doc: &mut Value, ops: &[PatchOp]) -> Result<(), PatchError> {
    for op in ops {
        apply_one(doc, op)?;
    }
    Ok(())
}

fn apply_one(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let path = op.path();
    let mut tokens = parse_pointer(path)?;

    let Some(last) = tokens.pop() else {
        return match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                *doc = value.clone();
                Ok(())
            }
            PatchOp::Remove { .. } => Err(PatchError::InvalidPointer(path.to_string())),
        };
    };

    let parent = resolve_mut(doc, &tokens, path)?;

    match parent {
        Value::Object(map) => match op {
            PatchOp::Add { value, .. } => {
                map.insert(last, value.clone());
                Ok(())
            }
            PatchOp::Replace { value, .. } => {
                let slot = map.get_mut(&last).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
                *slot = value.clone();
                Ok(())
            }
            PatchOp::Remove { .. } => map
                .shift_remove(&last)
                .map(|_| ())
                .ok_or_else(|| PatchError::PathNotFound(path.to_string())),
        },
        Value::Array(items) => {
            let len = items.len();
            if let PatchOp::Add { value, .. } = op
                && last == "-"
            {
                items.push(value.clone());
                return Ok(());
            }

            let index = parse_index(&last, path)?;
            let in_bounds = match op {
                PatchOp::Add { .. } => index <= len,
                PatchOp::Remove { .. } | PatchOp::Replace { .. } => index < len,
            };
            if !in_bounds {
                return Err(PatchError::IndexOutOfBounds { path: path.to_string(), index, len });
            }

            match op {
                PatchOp::Add { value, .. } => items.insert(index, value.clone()),
                PatchOp::Replace { value, .. } => items[index] = value.clone(),
                PatchOp::Remove { .. } => {
                    items.remove(index);
                }
            }
            Ok(())
        }
        _ => Err(PatchError::NotAContainer(path.to_string())),
    }
}

fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String], path: &str) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get_mut(token).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let len = items.len();
                let index = parse_index(token, path)?;
                items
                    .get_mut(index)
                    .ok_or_else(|| PatchError::IndexOutOfBounds { path: path.to_string(), index, len })?
            }
            _ => return Err(PatchError::NotAContainer(path.to_string())),
        };
    }
    Ok(current)
}

fn parse_index(token: &str, path: &str) -> Result<usize, PatchError> {
    if token.len() > 1 && token.starts_with('0') {
        return Err(PatchError::InvalidPointer(path.to_string()));
    }
    token.parse().map_err(|_| PatchError::InvalidPointer(path.to_string()))
}

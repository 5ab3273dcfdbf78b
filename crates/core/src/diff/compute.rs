use serde_json::{Map, Number, Value};

use super::PatchOp;
use super::pointer::push_token;

/// Compute the operations that turn `old` into `new`.
///
/// Total over all pairs of documents; equal inputs give an empty list.
pub fn diff(old: &Value, new: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    let mut path = String::new();
    diff_values(old, new, &mut path, &mut ops);
    ops
}

fn diff_values(old: &Value, new: &Value, path: &mut String, ops: &mut Vec<PatchOp>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => diff_objects(old_map, new_map, path, ops),
        (Value::Array(old_items), Value::Array(new_items)) => diff_arrays(old_items, new_items, path, ops),
        _ if values_equal(old, new) => {}
        _ => ops.push(PatchOp::Replace { path: path.clone(), value: new.clone() }),
    }
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>, path: &mut String, ops: &mut Vec<PatchOp>) {
    let base = path.len();

    for (key, old_value) in old.iter().rev() {
        push_token(path, key);
        match new.get(key) {
            Some(new_value) => diff_values(old_value, new_value, path, ops),
            None => ops.push(PatchOp::Remove { path: path.clone() }),
        }
        path.truncate(base);
    }

    for (key, new_value) in new {
        if old.contains_key(key) {
            continue;
        }
        push_token(path, key);
        ops.push(PatchOp::Add { path: path.clone(), value: new_value.clone() });
        path.truncate(base);
    }
}

fn diff_arrays(old: &[Value], new: &[Value], path: &mut String, ops: &mut Vec<PatchOp>) {
    let base = path.len();

    for (index, old_value) in old.iter().enumerate().rev() {
        push_token(path, &index.to_string());
        match new.get(index) {
            Some(new_value) => diff_values(old_value, new_value, path, ops),
            None => ops.push(PatchOp::Remove { path: path.clone() }),
        }
        path.truncate(base);
    }

    for (index, new_value) in new.iter().enumerate().skip(old.len()) {
        push_token(path, &index.to_string());
        ops.push(PatchOp::Add { path: path.clone(), value: new_value.clone() });
        path.truncate(base);
    }
}

/// Deep structural equality where numbers compare by value, so `1` equals `1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r)),
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(l), Some(r)) = (x.as_i64(), y.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (x.as_u64(), y.as_u64()) {
        return l == r;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

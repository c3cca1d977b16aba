//! Flat, delimited configuration keys and their nested-tree form.
//!
//! Layered configuration systems store hierarchical keys flattened with a
//! delimiter (`Smtp:Host`). This module converts between that flat form and a
//! nested JSON tree: secret documents are flattened into delimited entries,
//! and resolved entries are folded back into a tree.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Separator between hierarchy levels in a flattened configuration key.
pub const KEY_DELIMITER: &str = ":";

/// Flatten a JSON document into `(delimited path, value)` leaf entries.
///
/// Objects contribute their key names as path segments and arrays their
/// element indexes. Scalar leaves are rendered as strings; `null` becomes the
/// empty string.
pub fn flatten_document(document: &Value) -> Result<Vec<(String, String)>> {
    let root = document
        .as_object()
        .context("secret payload is not a JSON document")?;

    let mut entries = Vec::new();
    for (key, value) in root {
        flatten_value(key.clone(), value, &mut entries);
    }
    Ok(entries)
}

fn flatten_value(path: String, value: &Value, entries: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_value(format!("{path}{KEY_DELIMITER}{key}"), value, entries);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_value(format!("{path}{KEY_DELIMITER}{index}"), value, entries);
            }
        }
        Value::String(leaf) => entries.push((path, leaf.clone())),
        Value::Null => entries.push((path, String::new())),
        other => entries.push((path, other.to_string())),
    }
}

/// Insert one delimited key into a nested configuration tree.
///
/// Intermediate objects are created on demand. Whatever was previously stored
/// under the key is replaced, so later layers win.
pub fn insert_entry(root: &mut Value, key: &str, value: &str) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let map = root.as_object_mut().unwrap();
    match key.split_once(KEY_DELIMITER) {
        Some((head, rest)) => insert_entry(map.entry(head).or_insert(Value::Null), rest, value),
        None => {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
}

/// Fold a sequence of resolved entries into a configuration tree, in order.
pub fn apply_entries(root: &mut Value, entries: &[(String, String)]) {
    for (key, value) in entries {
        insert_entry(root, key, value);
    }
}

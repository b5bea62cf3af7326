//! Schema loading and local reference lookup.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::types::DEFINITION_KEYS;

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `SchemaError::FileNotFound` if the file doesn't exist,
/// or `SchemaError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, SchemaError> {
    if !path.exists() {
        return Err(SchemaError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_schema_str(&content)
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `SchemaError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(content).map_err(|source| SchemaError::InvalidJson { source })
}

/// Navigate a JSON Pointer fragment (e.g., "#/$defs/Address").
///
/// Returns `None` when any segment is missing.
pub fn navigate_fragment<'a>(schema: &'a Value, fragment: &str) -> Option<&'a Value> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Some(schema);
    }

    let mut current = schema;
    for part in path.split('/') {
        current = match current {
            Value::Object(map) => map.get(&unescape_pointer(part))?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Name of the local definition a `$ref` points at.
///
/// Only `#/$defs/<name>` and `#/definitions/<name>` are local definition
/// references; anything else (root self-references, deeper pointers,
/// external files) returns `None`.
pub fn definition_name(reference: &str) -> Option<String> {
    let path = reference.strip_prefix("#/")?;
    let (table, name) = path.split_once('/')?;
    if !DEFINITION_KEYS.contains(&table) || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(unescape_pointer(name))
}

/// Collect the root's type-definition table.
///
/// `$defs` and the legacy `definitions` are merged; `$defs` wins on conflict.
pub fn definitions(root: &Value) -> Map<String, Value> {
    let mut table = Map::new();
    for key in DEFINITION_KEYS.iter().rev() {
        if let Some(Value::Object(defs)) = root.get(*key) {
            for (name, def) in defs {
                table.insert(name.clone(), def.clone());
            }
        }
    }
    table
}

/// JSON Pointer of a local reference (`#` or `#/...`).
///
/// The result can be passed to `Value::pointer`; the root is `""`. External
/// references return `None`.
pub fn local_pointer(reference: &str) -> Option<&str> {
    let fragment = reference.strip_prefix('#')?;
    (fragment.is_empty() || fragment.starts_with('/')).then_some(fragment)
}

/// Escape a key for use as a JSON Pointer token.
pub(crate) fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

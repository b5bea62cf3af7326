//! Strict lowering - rewrites a schema into the subset accepted by
//! structured-output APIs.
//!
//! | Input                          | Output                                        |
//! |--------------------------------|-----------------------------------------------|
//! | `default`, `format`, `X-*`     | removed                                       |
//! | `"integer"` (alone or in list) | `"number"`                                    |
//! | `allOf`                        | merged into the parent node                   |
//! | `oneOf`                        | `anyOf`                                       |
//! | `enum`                         | values stringified, `type` forced to `string` |
//! | object                         | all properties required, closed               |
//!
//! Lowering recurses through `properties`, `patternProperties`, `items`,
//! `prefixItems`, `anyOf`, `not` and leftover definition tables.

use serde_json::{Map, Value};
use tracing::debug;

use crate::clean::{clean_schema, CleanOptions};
use crate::error::SchemaError;
use crate::types::{is_extension_key, is_object_schema};

/// Keywords dropped from every node.
const UNSUPPORTED_KEYWORDS: &[&str] = &["default", "format"];

/// Lower a schema into strict mode.
///
/// Expects an already expanded (and usually reasoning-augmented) schema; the
/// result never gains a `$ref` it did not already have. The final result is
/// passed through the cleaner with extensions removed.
///
/// # Errors
///
/// Returns `SchemaError::MalformedIntersection` for an `allOf` that is empty
/// or not an array.
pub fn to_strict_schema(schema: &Value) -> Result<Value, SchemaError> {
    let lowered = lower(schema, "")?;
    Ok(clean_schema(&lowered, &CleanOptions::new().remove_extensions(true)))
}

/// Stringify a JSON value the way JavaScript's `String(value)` does.
///
/// Floats use the shortest round-trip form, switching to exponent notation
/// (`1e+21`, `1e-7`) outside `[1e-6, 1e21)`; `-0` prints as `0`. Arrays join
/// their elements with `,` (nulls become empty) and objects print as
/// `[object Object]`. Integers print exactly, even beyond 2^53.
pub fn stringify_enum_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => stringify_float(f),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify_enum_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

fn stringify_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }
    let scientific = format!("{:e}", f);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => scientific,
    }
}

fn lower(value: &Value, path: &str) -> Result<Value, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(value.clone());
    };

    let mut map = map.clone();
    merge_all_of(&mut map, value, path)?;
    map.retain(|key, _| !UNSUPPORTED_KEYWORDS.contains(&key.as_str()) && !is_extension_key(key));

    if let Some(one_of) = map.shift_remove("oneOf") {
        map.entry("anyOf").or_insert(one_of);
    }

    if let Some(Value::Array(members)) = map.get("anyOf") {
        let lowered = lower_all(members, &format!("{}/anyOf", path))?;
        map.insert("anyOf".to_string(), Value::Array(lowered));
    }

    if let Some(kind) = map.get("type") {
        let kind = integer_to_number(kind);
        map.insert("type".to_string(), kind);
    }

    if let Some(Value::Array(values)) = map.get("enum") {
        if !values.is_empty() {
            let values = values
                .iter()
                .map(|v| Value::String(stringify_enum_value(v)))
                .collect();
            map.insert("enum".to_string(), Value::Array(values));
            map.insert("type".to_string(), Value::String("string".to_string()));
        }
    }

    if is_object_schema(&map) {
        close_object(&mut map, path)?;
    }

    for key in ["items", "prefixItems", "not"] {
        if let Some(child) = map.get(key) {
            let child_path = format!("{}/{}", path, key);
            let lowered = match child {
                Value::Array(members) => Value::Array(lower_all(members, &child_path)?),
                single => lower(single, &child_path)?,
            };
            map.insert(key.to_string(), lowered);
        }
    }

    for key in ["patternProperties", "$defs", "definitions"] {
        if let Some(Value::Object(entries)) = map.get(key) {
            let mut lowered = Map::new();
            for (name, entry) in entries {
                lowered.insert(name.clone(), lower(entry, &format!("{}/{}/{}", path, key, name))?);
            }
            map.insert(key.to_string(), Value::Object(lowered));
        }
    }

    Ok(Value::Object(map))
}

fn lower_all(members: &[Value], path: &str) -> Result<Vec<Value>, SchemaError> {
    members
        .iter()
        .enumerate()
        .map(|(i, member)| lower(member, &format!("{}/{}", path, i)))
        .collect()
}

/// Fold `allOf` members into the node.
///
/// A member carrying a `$ref` contributes only that reference. Inline members
/// are merged key by key: properties are unioned (later members win),
/// `required` lists are concatenated without duplicates, and other keys are
/// kept from the node when it already has them. Members may carry their own
/// `allOf`, so merging repeats until none is left.
fn merge_all_of(
    map: &mut Map<String, Value>,
    original: &Value,
    path: &str,
) -> Result<(), SchemaError> {
    while let Some(all_of) = map.shift_remove("allOf") {
        let members = match all_of {
            Value::Array(members) if !members.is_empty() => members,
            _ => return Err(SchemaError::malformed_intersection(path, 0, original)),
        };
        debug!(path, members = members.len(), "merging allOf");

        for member in members {
            let Value::Object(member) = member else {
                continue;
            };
            if let Some(reference) = member.get("$ref") {
                map.insert("$ref".to_string(), reference.clone());
                continue;
            }
            for (key, value) in member {
                merge_key(map, key, value);
            }
        }
    }
    Ok(())
}

fn merge_key(map: &mut Map<String, Value>, key: String, value: Value) {
    let Some(existing) = map.get_mut(&key) else {
        map.insert(key, value);
        return;
    };
    match (key.as_str(), existing, value) {
        ("properties", Value::Object(existing), Value::Object(incoming)) => {
            existing.extend(incoming);
        }
        ("required", Value::Array(existing), Value::Array(incoming)) => {
            for name in incoming {
                if !existing.contains(&name) {
                    existing.push(name);
                }
            }
        }
        _ => {}
    }
}

fn close_object(map: &mut Map<String, Value>, path: &str) -> Result<(), SchemaError> {
    let mut required = Vec::new();
    if let Some(Value::Object(properties)) = map.get("properties") {
        let mut lowered = Map::new();
        for (name, property) in properties {
            let property_path = format!("{}/properties/{}", path, name);
            lowered.insert(name.clone(), lower(property, &property_path)?);
            required.push(Value::String(name.clone()));
        }
        map.insert("properties".to_string(), Value::Object(lowered));
    }

    map.insert("required".to_string(), Value::Array(required));
    map.insert("additionalProperties".to_string(), Value::Bool(false));
    Ok(())
}

fn integer_to_number(kind: &Value) -> Value {
    match kind {
        Value::String(t) if t == "integer" => Value::String("number".to_string()),
        Value::Array(types) => {
            let mut converted: Vec<Value> = Vec::with_capacity(types.len());
            for t in types {
                let t = integer_to_number(t);
                if !converted.contains(&t) {
                    converted.push(t);
                }
            }
            Value::Array(converted)
        }
        other => other.clone(),
    }
}

//! Reference expansion - inlines local definitions into the schema tree.

use serde_json::{Map, Value};
use tracing::warn;

use crate::cycle::has_cycle;
use crate::error::SchemaError;
use crate::loader::local_pointer;
use crate::types::DEFINITION_KEYS;

/// Inline every local `$ref` with a copy of its target.
///
/// Targets are JSON Pointers resolved against the original document, so
/// `#/$defs/A`, `#/definitions/A` and deeper pointers such as
/// `#/$defs/Address/properties/city` each inline the node they name. The
/// root's definition tables are removed from the result. A root `allOf` must
/// hold exactly one member, which is merged into the root. When following
/// references can loop the schema is returned unchanged: partial expansion
/// could silently drop a recursive branch.
///
/// At a reference site, the site's own keys (notably `description`) take
/// precedence over the target's; keys the site lacks are taken from the
/// target.
///
/// # Errors
///
/// Returns `SchemaError::MalformedIntersection` when the root `allOf` does not
/// have exactly one member.
pub fn expand_refs(schema: &Value) -> Result<Value, SchemaError> {
    let Value::Object(root) = schema else {
        return Ok(schema.clone());
    };

    if has_cycle(schema) {
        warn!("cycle detected in schema references, returning schema without expanding $ref");
        return Ok(schema.clone());
    }

    let mut root = root.clone();
    for key in DEFINITION_KEYS {
        root.shift_remove(*key);
    }

    if let Some(all_of) = root.shift_remove("allOf") {
        match all_of.as_array().map(Vec::as_slice) {
            Some([Value::Object(member)]) => {
                for (key, value) in member {
                    root.insert(key.clone(), value.clone());
                }
            }
            other => {
                let count = other.map_or(0, <[Value]>::len);
                return Err(SchemaError::malformed_intersection("", count, schema));
            }
        }
    }

    Ok(expand_node(&Value::Object(root), schema))
}

/// Expand one node; `document` is the untouched original used for lookups.
fn expand_node(value: &Value, document: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    let target = map
        .get("$ref")
        .and_then(|r| r.as_str())
        .and_then(local_pointer)
        .and_then(|pointer| document.pointer(pointer));

    let mut result = match target {
        Some(target) => match expand_node(target, document) {
            Value::Object(inlined) => inlined,
            // Boolean schemas have nothing to merge into
            other => return other,
        },
        None => Map::new(),
    };

    for (key, child) in map {
        if target.is_some() && key == "$ref" {
            continue;
        }
        result.insert(key.clone(), expand_child(key, child, document));
    }

    Value::Object(result)
}

fn expand_child(key: &str, child: &Value, document: &Value) -> Value {
    match key {
        "properties" | "patternProperties" | "$defs" | "definitions" => match child {
            Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, schema)| (name.clone(), expand_node(schema, document)))
                    .collect(),
            ),
            other => other.clone(),
        },
        "items" | "additionalProperties" | "not" | "anyOf" | "allOf" | "oneOf"
        | "prefixItems" => match child {
            Value::Array(members) => Value::Array(
                members
                    .iter()
                    .map(|member| expand_node(member, document))
                    .collect(),
            ),
            other => expand_node(other, document),
        },
        _ => child.clone(),
    }
}

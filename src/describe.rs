//! Natural-language rendering.
//!
//! Produces an indented bullet outline of a schema for use in prompts:
//!
//! ```text
//! Invoice: object containing:
//! - number (required): text string
//!   Description: Invoice number
//! - lines: array of object containing:
//!   - sku: text string
//! - total: nullable number
//! ```
//!
//! A node carrying `X-FieldPrompt` is described by that prompt alone; its
//! structure is not rendered.

use serde_json::{Map, Value};

use crate::loader::{definition_name, definitions};
use crate::types::{extension_str, is_object_schema, required_names, ExtensionKey};

const INDENT: &str = "  ";

/// Render a schema as a natural-language outline.
pub fn nlp_description(schema: &Value) -> String {
    let label = schema
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("Root");

    let mut lines = Vec::new();
    entry(&mut lines, format!("{}: ", label), schema, 0);

    let defs = definitions(schema);
    if !defs.is_empty() {
        lines.push("Definitions:".to_string());
        for (name, def) in &defs {
            entry(&mut lines, format!("- {}: ", name), def, 1);
        }
    }

    lines.join("\n")
}

/// Push the line for `node` (prefixed by `prefix`), its description, then its
/// children at `depth`.
fn entry(out: &mut Vec<String>, prefix: String, node: &Value, depth: usize) {
    let mut children = Vec::new();
    let head = phrase(node, depth, &mut children);
    out.push(format!("{}{}", prefix, head));

    if let Value::Object(map) = node {
        let prompted = extension_str(map, ExtensionKey::FieldPrompt).is_some();
        let description = map.get("description").and_then(|d| d.as_str());
        if let (false, Some(description)) = (prompted, description) {
            out.push(format!(
                "{}Description: {}",
                INDENT.repeat(depth),
                single_line(description)
            ));
        }
    }
    out.extend(children);
}

/// Describe a node in one phrase, pushing any nested bullets into `children`.
fn phrase(node: &Value, depth: usize, children: &mut Vec<String>) -> String {
    let Value::Object(map) = node else {
        return "any value".to_string();
    };

    if let Some(prompt) = extension_str(map, ExtensionKey::FieldPrompt) {
        return single_line(prompt);
    }
    if let Some(reference) = map.get("$ref").and_then(|r| r.as_str()) {
        return match definition_name(reference) {
            Some(name) => format!("reference to {}", name),
            None if reference == "#" => "reference to the root object".to_string(),
            None => "any value".to_string(),
        };
    }
    if let Some(Value::Array(values)) = map.get("enum") {
        if !values.is_empty() {
            let values: Vec<String> = values.iter().map(Value::to_string).collect();
            return format!("one of: {}", values.join(", "));
        }
    }
    if let Some(value) = map.get("const") {
        return format!("exactly {}", value);
    }
    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(members)) = map.get(key) {
            return variants("one of:", members, depth, children);
        }
    }
    if let Some(Value::Array(members)) = map.get("allOf") {
        return match members.as_slice() {
            [single] => phrase(single, depth, children),
            _ => variants("all of:", members, depth, children),
        };
    }

    match map.get("type") {
        Some(Value::String(kind)) => kind_phrase(kind, map, depth, children),
        Some(Value::Array(kinds)) => {
            let kinds: Vec<&str> = kinds.iter().filter_map(|k| k.as_str()).collect();
            let non_null: Vec<&str> = kinds.iter().copied().filter(|k| *k != "null").collect();
            let base = match non_null.as_slice() {
                [] => return "null".to_string(),
                [kind] => kind_phrase(kind, map, depth, children),
                several => {
                    let phrases: Vec<String> = several
                        .iter()
                        .map(|kind| kind_phrase(kind, map, depth, children))
                        .collect();
                    format!("one of: {}", phrases.join(", "))
                }
            };
            if kinds.len() > non_null.len() {
                format!("nullable {}", base)
            } else {
                base
            }
        }
        _ if map.contains_key("properties") => kind_phrase("object", map, depth, children),
        _ if map.contains_key("items") => kind_phrase("array", map, depth, children),
        _ => "any value".to_string(),
    }
}

fn kind_phrase(
    kind: &str,
    map: &Map<String, Value>,
    depth: usize,
    children: &mut Vec<String>,
) -> String {
    match kind {
        "string" => match map.get("format").and_then(|f| f.as_str()) {
            Some(format) => format!("text string ({})", format),
            None => "text string".to_string(),
        },
        "number" => "number".to_string(),
        "integer" => "integer".to_string(),
        "boolean" => "boolean".to_string(),
        "null" => "null".to_string(),
        "array" => match map.get("items") {
            Some(items @ Value::Object(_)) => format!("array of {}", phrase(items, depth, children)),
            _ => "array of any value".to_string(),
        },
        "object" => object_phrase(map, depth, children),
        _ => "any value".to_string(),
    }
}

fn object_phrase(map: &Map<String, Value>, depth: usize, children: &mut Vec<String>) -> String {
    let properties = match map.get("properties") {
        Some(Value::Object(properties)) if !properties.is_empty() && is_object_schema(map) => {
            properties
        }
        _ => return "object with no fixed fields".to_string(),
    };

    let required = required_names(map);
    let pad = INDENT.repeat(depth);
    for (name, property) in properties {
        let marker = if required.contains(name) { " (required)" } else { "" };
        entry(children, format!("{}- {}{}: ", pad, name, marker), property, depth + 1);
    }
    "object containing:".to_string()
}

fn variants(head: &str, members: &[Value], depth: usize, children: &mut Vec<String>) -> String {
    let pad = INDENT.repeat(depth);
    for member in members {
        entry(children, format!("{}- ", pad), member, depth + 1);
    }
    head.to_string()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Reasoning augmentation - adds companion `reasoning___*` fields.
//!
//! Every data field gets a sibling string field the model fills with its
//! justification before producing the value. Array items that are objects get
//! a leading `reasoning___item` field, and a root-level reasoning hint adds a
//! trailing `reasoning___root` field.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::types::{
    is_array_schema, is_object_schema, required_names, ExtensionKey, ITEM_REASONING_KEY,
    REASONING_PREFIX, ROOT_REASONING_KEY,
};

/// Insert reasoning fields throughout a schema.
///
/// Reasoning hints (`X-ReasoningPrompt`) become the descriptions of the
/// generated fields and are removed from the nodes that carried them. Fields
/// without a hint get `"Reasoning for <name>"`.
pub fn create_reasoning_schema(schema: &Value) -> Value {
    let mut root = schema.clone();
    let root_hint = augment_node(&mut root);

    if let (Some(hint), Value::Object(map)) = (root_hint, &mut root) {
        if is_object_schema(map) {
            let properties = map
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(properties) = properties {
                properties
                    .entry(ROOT_REASONING_KEY)
                    .or_insert_with(|| reasoning_field(&hint));
            }
            if let Some(Value::Array(required)) = map.get_mut("required") {
                let key = Value::String(ROOT_REASONING_KEY.to_string());
                if !required.contains(&key) {
                    required.push(key);
                }
            }
        }
    }

    root
}

/// Name of the reasoning field generated for `property`.
pub fn reasoning_key(property: &str) -> String {
    format!("{}{}", REASONING_PREFIX, property)
}

/// Augment a node in place, returning the reasoning hint it carried.
fn augment_node(value: &mut Value) -> Option<String> {
    let Value::Object(map) = value else {
        return None;
    };

    let hint = take_hint(map);

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(members)) = map.get_mut(key) {
            for member in members {
                augment_node(member);
            }
        }
    }
    for key in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = map.get_mut(key) {
            for def in defs.values_mut() {
                augment_node(def);
            }
        }
    }

    if is_object_schema(map) {
        augment_properties(map);
    }

    if is_array_schema(map) {
        if let Some(items) = map.get_mut("items") {
            let item_hint = augment_node(items);
            if let Value::Object(items) = items {
                if is_object_schema(items) {
                    let description = item_hint.unwrap_or_else(|| "Reasoning for item".to_string());
                    prepend_item_reasoning(items, &description);
                }
            }
        }
    }

    hint
}

fn augment_properties(map: &mut Map<String, Value>) {
    let required = required_names(map);
    let Some(Value::Object(properties)) = map.get_mut("properties") else {
        return;
    };

    let properties = std::mem::take(properties);
    let existing: HashSet<String> = properties.keys().cloned().collect();
    let mut augmented = Map::new();
    let mut required_reasoning = Vec::new();

    for (name, mut property) in properties {
        let hint = augment_node(&mut property);
        augmented.insert(name.clone(), property);

        let reasoning_name = reasoning_key(&name);
        if name.starts_with(REASONING_PREFIX) || existing.contains(&reasoning_name) {
            continue;
        }

        let description = hint.unwrap_or_else(|| format!("Reasoning for {}", name));
        augmented.insert(reasoning_name.clone(), reasoning_field(&description));
        if required.contains(&name) {
            required_reasoning.push(Value::String(reasoning_name));
        }
    }

    map.insert("properties".to_string(), Value::Object(augmented));
    if let Some(Value::Array(required)) = map.get_mut("required") {
        required.extend(required_reasoning);
    }
}

fn prepend_item_reasoning(items: &mut Map<String, Value>, description: &str) {
    let properties = match items.get_mut("properties") {
        Some(Value::Object(properties)) => std::mem::take(properties),
        _ => Map::new(),
    };
    if properties.contains_key(ITEM_REASONING_KEY) {
        items.insert("properties".to_string(), Value::Object(properties));
        return;
    }

    let mut reordered = Map::new();
    reordered.insert(ITEM_REASONING_KEY.to_string(), reasoning_field(description));
    reordered.extend(properties);
    items.insert("properties".to_string(), Value::Object(reordered));
}

fn take_hint(map: &mut Map<String, Value>) -> Option<String> {
    let key = ExtensionKey::ReasoningPrompt.as_str();
    if !map.get(key).map_or(false, Value::is_string) {
        return None;
    }
    map.shift_remove(key).and_then(|v| v.as_str().map(String::from))
}

fn reasoning_field(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

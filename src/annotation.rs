//! Annotation access - read and write extension attributes by node pattern.
//!
//! A pattern addresses a schema node by property path:
//!
//! | Pattern              | Node                                          |
//! |----------------------|-----------------------------------------------|
//! | `""` or `"."`        | the root                                      |
//! | `address.city`       | property `city` of property `address`         |
//! | `lines.*.sku`        | property `sku` of the items of `lines`        |
//! | `lines[].sku`        | same as above (`[*]` is accepted too)         |
//! | `meta["a.b"]`        | property `a.b` of property `meta`             |
//!
//! Navigation looks through local `$ref` pointers, single-member `allOf`
//! wrappers and `anyOf`/`oneOf` branches (first branch that has the next step).
//! A pattern that cannot be parsed or resolved is a miss: `get` returns
//! `None` and `set` leaves the schema untouched.

use std::collections::HashSet;
use std::str::Chars;

use serde_json::{Map, Value};
use tracing::debug;

use crate::loader::{escape_pointer, local_pointer};
use crate::types::ExtensionKey;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Property(String),
    Items,
}

/// Resolve a pattern to a JSON Pointer into `root`.
///
/// The pointer can be passed to `Value::pointer`; the root is `""`.
pub fn resolve_pattern(root: &Value, pattern: &str) -> Option<String> {
    let steps = parse_pattern(pattern)?;
    let mut pointer = String::new();
    root.pointer(&pointer)?.as_object()?;
    for step in &steps {
        let mut visited = HashSet::new();
        pointer = descend(root, &pointer, step, &mut visited)?;
    }
    Some(pointer)
}

/// Read a string extension attribute from the node at `pattern`.
pub fn get_pattern_attribute(root: &Value, pattern: &str, key: ExtensionKey) -> Option<String> {
    let pointer = resolve_pattern(root, pattern)?;
    root.pointer(&pointer)?
        .get(key.as_str())?
        .as_str()
        .map(String::from)
}

/// Write an extension attribute on the node at `pattern`.
///
/// Returns `false` and leaves the schema unchanged when the pattern matches
/// no node.
pub fn set_pattern_attribute(
    root: &mut Value,
    pattern: &str,
    key: ExtensionKey,
    value: impl Into<String>,
) -> bool {
    match node_mut(root, pattern) {
        Some(node) => {
            node.insert(key.as_str().to_string(), Value::String(value.into()));
            true
        }
        None => {
            debug!(pattern, attribute = %key, "annotation pattern matched no schema node");
            false
        }
    }
}

/// Remove an extension attribute from the node at `pattern`.
///
/// Returns the previous value when it was a string.
pub fn remove_pattern_attribute(
    root: &mut Value,
    pattern: &str,
    key: ExtensionKey,
) -> Option<String> {
    let node = node_mut(root, pattern)?;
    match node.shift_remove(key.as_str())? {
        Value::String(previous) => Some(previous),
        _ => None,
    }
}

fn node_mut<'a>(root: &'a mut Value, pattern: &str) -> Option<&'a mut Map<String, Value>> {
    let pointer = resolve_pattern(root, pattern)?;
    root.pointer_mut(&pointer)?.as_object_mut()
}

/// Take one step from the node at `pointer`, looking through wrappers.
fn descend(
    root: &Value,
    pointer: &str,
    step: &Step,
    visited: &mut HashSet<String>,
) -> Option<String> {
    let map = root.pointer(pointer)?.as_object()?;

    let direct = match step {
        Step::Property(name) => map
            .get("properties")
            .and_then(Value::as_object)
            .filter(|properties| properties.get(name).map_or(false, Value::is_object))
            .map(|_| format!("{}/properties/{}", pointer, escape_pointer(name))),
        Step::Items => map
            .get("items")
            .filter(|items| items.is_object())
            .map(|_| format!("{}/items", pointer)),
    };
    if direct.is_some() {
        return direct;
    }

    if let Some(target) = map.get("$ref").and_then(Value::as_str) {
        let target = local_pointer(target)?.to_string();
        if !visited.insert(target.clone()) {
            return None;
        }
        return descend(root, &target, step, visited);
    }

    if let Some(Value::Array(members)) = map.get("allOf") {
        if members.len() == 1 {
            return descend(root, &format!("{}/allOf/0", pointer), step, visited);
        }
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(members)) = map.get(key) {
            for index in 0..members.len() {
                let branch = format!("{}/{}/{}", pointer, key, index);
                if let Some(found) = descend(root, &branch, step, visited) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn parse_pattern(pattern: &str) -> Option<Vec<Step>> {
    let pattern = pattern.trim();
    if pattern.is_empty() || pattern == "." {
        return Some(Vec::new());
    }

    let mut steps = Vec::new();
    let mut name = String::new();
    // A separator (or the start) is waiting for a segment.
    let mut dangling = true;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if dangling {
                    return None;
                }
                flush_name(&mut name, &mut steps);
                dangling = true;
            }
            '[' => {
                flush_name(&mut name, &mut steps);
                steps.push(parse_bracket(&mut chars)?);
                dangling = false;
            }
            ']' | '"' => return None,
            other => {
                name.push(other);
                dangling = false;
            }
        }
    }
    if dangling {
        return None;
    }
    flush_name(&mut name, &mut steps);
    Some(steps)
}

fn flush_name(name: &mut String, steps: &mut Vec<Step>) {
    if name.is_empty() {
        return;
    }
    let segment = std::mem::take(name);
    if segment == "*" {
        steps.push(Step::Items);
    } else {
        steps.push(Step::Property(segment));
    }
}

/// Parse the remainder of `[...]`: `[]`, `[*]` or `["quoted name"]`.
fn parse_bracket(chars: &mut Chars<'_>) -> Option<Step> {
    match chars.next()? {
        ']' => Some(Step::Items),
        '*' => (chars.next()? == ']').then_some(Step::Items),
        '"' => {
            let mut name = String::new();
            loop {
                match chars.next()? {
                    '\\' => name.push(chars.next()?),
                    '"' => break,
                    c => name.push(c),
                }
            }
            (chars.next()? == ']').then_some(Step::Property(name))
        }
        _ => None,
    }
}

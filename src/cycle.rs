//! Cycle detection over local references.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::loader::local_pointer;

/// Keywords whose values are instance data, not subschemas.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples"];

/// Whether following local `$ref`s from the root can loop.
///
/// Reference targets are identified by JSON Pointer, so `#/$defs/A`,
/// `#/definitions/A` and deeper pointers such as `#/$defs/A/properties/b` are
/// distinct nodes. Each target's subtree is searched depth-first through every
/// subschema position (`properties`, `items`, `anyOf`, `allOf`, ...). A
/// reference back to a pointer on the current path is a cycle; this includes
/// `$ref: "#"` and any reference to an ancestor of the reference site.
/// Results are memoized per pointer. References that do not resolve are not
/// cycles.
pub fn has_cycle(root: &Value) -> bool {
    let mut memo = HashMap::new();
    let mut path = HashSet::new();
    visit("", root, &mut path, &mut memo)
}

fn visit(
    pointer: &str,
    root: &Value,
    path: &mut HashSet<String>,
    memo: &mut HashMap<String, bool>,
) -> bool {
    if path.contains(pointer) {
        return true;
    }
    if let Some(&cyclic) = memo.get(pointer) {
        return cyclic;
    }
    let Some(body) = root.pointer(pointer) else {
        return false;
    };

    path.insert(pointer.to_string());
    let mut targets = Vec::new();
    collect_references(body, &mut targets);
    let cyclic = targets
        .iter()
        .any(|target| visit(target, root, path, memo));
    path.remove(pointer);

    memo.insert(pointer.to_string(), cyclic);
    cyclic
}

/// Collect the pointers of local references anywhere under `value`.
fn collect_references(value: &Value, targets: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(pointer) = map
                .get("$ref")
                .and_then(|r| r.as_str())
                .and_then(local_pointer)
            {
                targets.push(pointer.to_string());
            }
            for (key, child) in map {
                if !DATA_KEYWORDS.contains(&key.as_str()) {
                    collect_references(child, targets);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                collect_references(item, targets);
            }
        }
        _ => {}
    }
}

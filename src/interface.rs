//! Typed-interface rendering.
//!
//! Renders a schema as a TypeScript-style declaration. Properties missing
//! from `required` are optional (`name?:`), descriptions become trailing
//! `//` comments, and shapes that have no TypeScript counterpart render as
//! `any`. Definitions left in the schema (a cyclic table that could not be
//! expanded) are emitted as additional declarations after the root.

use serde_json::{Map, Value};

use crate::loader::{definition_name, definitions};
use crate::types::{is_object_schema, required_names};

const INDENT: &str = "  ";

/// Fallback name when the root has no `title`.
pub const DEFAULT_INTERFACE_NAME: &str = "RootSchema";

/// Render a schema as an interface declaration.
pub fn typescript_interface(schema: &Value) -> String {
    let root_name = schema
        .get("title")
        .and_then(|t| t.as_str())
        .map(type_name)
        .unwrap_or_else(|| DEFAULT_INTERFACE_NAME.to_string());
    let renderer = Renderer {
        root_name: &root_name,
    };

    let mut out = renderer.declaration(&root_name, schema);
    for (name, def) in definitions(schema) {
        out.push_str("\n\n");
        out.push_str(&renderer.declaration(&type_name(&name), &def));
    }
    out
}

/// Turn a title or definition name into a type identifier.
///
/// `"line item"` becomes `LineItem`; names starting with a digit get a `T`
/// prefix.
pub fn type_name(raw: &str) -> String {
    let mut name: String = raw
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() {
        return DEFAULT_INTERFACE_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'T');
    }
    name
}

struct Renderer<'a> {
    root_name: &'a str,
}

impl Renderer<'_> {
    fn declaration(&self, name: &str, node: &Value) -> String {
        match node {
            Value::Object(map) if is_object_schema(map) => {
                format!("interface {} {}", name, self.object_body(map, 0))
            }
            _ => format!("type {} = {};", name, self.ts_type(node, 0)),
        }
    }

    fn object_body(&self, map: &Map<String, Value>, depth: usize) -> String {
        let Some(Value::Object(properties)) = map.get("properties") else {
            return "{}".to_string();
        };
        if properties.is_empty() {
            return "{}".to_string();
        }

        let required = required_names(map);
        let pad = INDENT.repeat(depth + 1);
        let mut out = String::from("{\n");
        for (name, property) in properties {
            let optional = if required.contains(name) { "" } else { "?" };
            out.push_str(&format!(
                "{}{}{}: {};",
                pad,
                member_name(name),
                optional,
                self.ts_type(property, depth + 1)
            ));
            if let Some(description) = property.get("description").and_then(|d| d.as_str()) {
                out.push_str(" // ");
                out.push_str(&single_line(description));
            }
            out.push('\n');
        }
        out.push_str(&INDENT.repeat(depth));
        out.push('}');
        out
    }

    fn ts_type(&self, node: &Value, depth: usize) -> String {
        let Value::Object(map) = node else {
            return "any".to_string();
        };

        if let Some(reference) = map.get("$ref").and_then(|r| r.as_str()) {
            return match reference {
                "#" => self.root_name.to_string(),
                other => definition_name(other)
                    .map(|name| type_name(&name))
                    .unwrap_or_else(|| "any".to_string()),
            };
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            if !values.is_empty() {
                return values.iter().map(literal).collect::<Vec<_>>().join(" | ");
            }
        }
        if let Some(value) = map.get("const") {
            return literal(value);
        }
        for (key, separator) in [("anyOf", " | "), ("oneOf", " | "), ("allOf", " & ")] {
            if let Some(Value::Array(members)) = map.get(key) {
                if !members.is_empty() {
                    return members
                        .iter()
                        .map(|member| self.ts_type(member, depth))
                        .collect::<Vec<_>>()
                        .join(separator);
                }
            }
        }

        match map.get("type") {
            Some(Value::String(kind)) => self.primitive(kind, map, depth),
            Some(Value::Array(kinds)) => kinds
                .iter()
                .map(|kind| match kind.as_str() {
                    Some(kind) => self.primitive(kind, map, depth),
                    None => "any".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" | "),
            _ if map.contains_key("properties") => self.object_type(map, depth),
            _ if map.contains_key("items") => self.array_type(map, depth),
            _ => "any".to_string(),
        }
    }

    fn primitive(&self, kind: &str, map: &Map<String, Value>, depth: usize) -> String {
        match kind {
            "string" => "string".to_string(),
            "number" | "integer" => "number".to_string(),
            "boolean" => "boolean".to_string(),
            "null" => "null".to_string(),
            "array" => self.array_type(map, depth),
            "object" => self.object_type(map, depth),
            _ => "any".to_string(),
        }
    }

    fn array_type(&self, map: &Map<String, Value>, depth: usize) -> String {
        match map.get("items") {
            Some(items @ Value::Object(_)) => format!("Array<{}>", self.ts_type(items, depth)),
            Some(Value::Array(tuple)) => format!(
                "[{}]",
                tuple
                    .iter()
                    .map(|item| self.ts_type(item, depth))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            _ => "Array<any>".to_string(),
        }
    }

    fn object_type(&self, map: &Map<String, Value>, depth: usize) -> String {
        let has_properties = map
            .get("properties")
            .and_then(|p| p.as_object())
            .map_or(false, |p| !p.is_empty());
        if has_properties {
            return self.object_body(map, depth);
        }
        match map.get("additionalProperties") {
            Some(value @ Value::Object(_)) => {
                format!("Record<string, {}>", self.ts_type(value, depth))
            }
            _ => "Record<string, any>".to_string(),
        }
    }
}

fn member_name(name: &str) -> String {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        Value::String(name.to_string()).to_string()
    }
}

fn literal(value: &Value) -> String {
    value.to_string()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Core types and reserved names shared by the compilation stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix that marks a key as an extension attribute.
pub const EXTENSION_PREFIX: &str = "X-";

/// Prefix of synthesized reasoning properties.
pub const REASONING_PREFIX: &str = "reasoning___";

/// Reasoning property prepended to array item objects.
pub const ITEM_REASONING_KEY: &str = "reasoning___item";

/// Reasoning property appended to the root object.
pub const ROOT_REASONING_KEY: &str = "reasoning___root";

/// Keys holding a local type-definition table.
pub const DEFINITION_KEYS: &[&str] = &["$defs", "definitions"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Recognised extension attributes.
///
/// Extension attributes are invisible to schema consumers: the cleaner and the
/// strict compiler remove every `X-` key, recognised or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionKey {
    /// Custom system prompt, read from the root node.
    #[serde(rename = "X-SystemPrompt")]
    SystemPrompt,
    /// Description of the reasoning field generated for a node.
    #[serde(rename = "X-ReasoningPrompt")]
    ReasoningPrompt,
    /// Free-text description that replaces the rendered structure of a node.
    #[serde(rename = "X-FieldPrompt")]
    FieldPrompt,
    /// Translation hint for a field.
    #[serde(rename = "X-TranslationHint")]
    TranslationHint,
}

impl ExtensionKey {
    pub const ALL: [ExtensionKey; 4] = [
        ExtensionKey::SystemPrompt,
        ExtensionKey::ReasoningPrompt,
        ExtensionKey::FieldPrompt,
        ExtensionKey::TranslationHint,
    ];

    /// Returns the schema key for this attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKey::SystemPrompt => "X-SystemPrompt",
            ExtensionKey::ReasoningPrompt => "X-ReasoningPrompt",
            ExtensionKey::FieldPrompt => "X-FieldPrompt",
            ExtensionKey::TranslationHint => "X-TranslationHint",
        }
    }

    /// Parse an attribute from its schema key.
    ///
    /// Returns `None` for keys outside the recognised set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

impl std::fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtensionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
            format!("unknown extension key \"{}\": expected {}", s, known.join(", "))
        })
    }
}

/// Whether a key is an extension attribute.
pub fn is_extension_key(key: &str) -> bool {
    key.starts_with(EXTENSION_PREFIX)
}

/// Read a string-valued extension attribute from a schema node.
pub fn extension_str(map: &Map<String, Value>, key: ExtensionKey) -> Option<&str> {
    map.get(key.as_str()).and_then(|v| v.as_str())
}

/// Whether a node describes an object: `type: "object"` (alone or in a type
/// list) or a `properties` map.
pub fn is_object_schema(map: &Map<String, Value>) -> bool {
    has_type(map, "object") || map.get("properties").map_or(false, Value::is_object)
}

/// Whether a node describes an array.
pub fn is_array_schema(map: &Map<String, Value>) -> bool {
    has_type(map, "array") || (map.get("type").is_none() && map.contains_key("items"))
}

/// Whether `type` is `name` or a list containing `name`.
pub fn has_type(map: &Map<String, Value>, name: &str) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

/// Names listed in a node's `required` array.
pub fn required_names(map: &Map<String, Value>) -> Vec<String> {
    map.get("required")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extension_key_round_trips_names() {
        for key in ExtensionKey::ALL {
            assert_eq!(ExtensionKey::parse(key.as_str()), Some(key));
            assert!(is_extension_key(key.as_str()));
        }
    }

    #[test]
    fn extension_key_parse_invalid() {
        assert_eq!(ExtensionKey::parse("X-Unknown"), None);
        assert_eq!(ExtensionKey::parse("description"), None);
        assert!("X-Nope".parse::<ExtensionKey>().is_err());
    }

    #[test]
    fn extension_key_serde_uses_schema_key() {
        let encoded = serde_json::to_string(&ExtensionKey::FieldPrompt).unwrap();
        assert_eq!(encoded, r#""X-FieldPrompt""#);
    }

    #[test]
    fn object_and_array_detection() {
        let obj = json!({ "type": ["object", "null"] });
        assert!(is_object_schema(obj.as_object().unwrap()));

        let implicit = json!({ "properties": {} });
        assert!(is_object_schema(implicit.as_object().unwrap()));

        let arr = json!({ "items": { "type": "string" } });
        assert!(is_array_schema(arr.as_object().unwrap()));

        let string = json!({ "type": "string" });
        assert!(!is_object_schema(string.as_object().unwrap()));
        assert!(!is_array_schema(string.as_object().unwrap()));
    }

    #[test]
    fn required_names_ignores_non_strings() {
        let node = json!({ "required": ["a", 1, "b"] });
        assert_eq!(required_names(node.as_object().unwrap()), vec!["a", "b"]);
    }
}

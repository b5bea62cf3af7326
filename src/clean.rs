//! Schema cleaning - strips extension attributes to produce a public schema.

use serde_json::{Map, Value};

use crate::types::is_extension_key;

/// Keywords whose values are property/definition names mapped to subschemas.
const NAMED_SCHEMA_KEYWORDS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// Keywords whose values are instance data and are copied verbatim.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples"];

/// Options for schema cleaning.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Drop every `X-` extension attribute.
    pub remove_extensions: bool,
    /// Additional schema keywords to drop at every level.
    pub remove_keywords: Vec<String>,
}

impl CleanOptions {
    /// Options that copy the schema unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether extension attributes are removed.
    pub fn remove_extensions(mut self, remove: bool) -> Self {
        self.remove_extensions = remove;
        self
    }

    /// Drop these keywords wherever they appear as schema keywords.
    ///
    /// Property names are never affected: a property called `description`
    /// survives removing the `description` keyword.
    pub fn remove_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_keywords
            .extend(keywords.into_iter().map(Into::into));
        self
    }

    fn drops(&self, key: &str) -> bool {
        (self.remove_extensions && is_extension_key(key))
            || self.remove_keywords.iter().any(|k| k == key)
    }
}

/// Deep-copy a schema, dropping the keys selected by `options`.
///
/// Cleaning is idempotent: `clean_schema(&clean_schema(s, o), o) == clean_schema(s, o)`.
pub fn clean_schema(schema: &Value, options: &CleanOptions) -> Value {
    match schema {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, value) in map {
                if options.drops(key) {
                    continue;
                }
                let cleaned = if NAMED_SCHEMA_KEYWORDS.contains(&key.as_str()) {
                    clean_named(value, options)
                } else if DATA_KEYWORDS.contains(&key.as_str()) {
                    value.clone()
                } else {
                    clean_schema(value, options)
                };
                result.insert(key.clone(), cleaned);
            }
            Value::Object(result)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| clean_schema(v, options)).collect()),
        other => other.clone(),
    }
}

/// Strip all extension attributes from a schema.
pub fn strip_extensions(schema: &Value) -> Value {
    clean_schema(schema, &CleanOptions::new().remove_extensions(true))
}

fn clean_named(value: &Value, options: &CleanOptions) -> Value {
    match value {
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(name, schema)| (name.clone(), clean_schema(schema, options)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotated() -> Value {
        json!({
            "type": "object",
            "X-SystemPrompt": "Extract invoices",
            "properties": {
                "X-weird": { "type": "string", "X-FieldPrompt": "kept name" },
                "lines": {
                    "type": "array",
                    "items": {
                        "anyOf": [
                            { "type": "string", "X-ReasoningPrompt": "why" },
                            { "type": "null" }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn strip_extensions_removes_all_levels() {
        let result = strip_extensions(&annotated());

        assert!(result.get("X-SystemPrompt").is_none());
        assert_eq!(result["properties"]["X-weird"], json!({ "type": "string" }));
        assert_eq!(
            result["properties"]["lines"]["items"]["anyOf"][0],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn default_options_copy_unchanged() {
        let schema = annotated();
        assert_eq!(clean_schema(&schema, &CleanOptions::new()), schema);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let options = CleanOptions::new()
            .remove_extensions(true)
            .remove_keywords(["description", "title"]);
        let once = clean_schema(&annotated(), &options);
        let twice = clean_schema(&once, &options);
        assert_eq!(once, twice);
    }

    #[test]
    fn keyword_removal_spares_property_names() {
        let schema = json!({
            "type": "object",
            "description": "Root",
            "properties": {
                "description": { "type": "string", "description": "A field called description" }
            }
        });
        let options = CleanOptions::new().remove_keywords(["description"]);
        let result = clean_schema(&schema, &options);

        assert!(result.get("description").is_none());
        assert_eq!(result["properties"]["description"], json!({ "type": "string" }));
    }

    #[test]
    fn data_keywords_are_copied_verbatim() {
        let schema = json!({
            "type": "object",
            "default": { "X-keep": 1 },
            "enum": [{ "X-keep": 2 }]
        });
        let result = strip_extensions(&schema);
        assert_eq!(result, schema);
    }
}

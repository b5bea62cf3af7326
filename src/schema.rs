//! Schema façade - the live root plus every derived view.
//!
//! Views are recomputed from the current root on each call, so annotations
//! written through [`Schema::set`] show up in the next prompt or strict schema.

use std::path::Path;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::annotation::{get_pattern_attribute, remove_pattern_attribute, set_pattern_attribute};
use crate::clean::strip_extensions;
use crate::describe::nlp_description;
use crate::error::SchemaError;
use crate::expand::expand_refs;
use crate::identity::{schema_data_id, schema_id};
use crate::interface::typescript_interface;
use crate::loader::{load_schema, load_schema_str};
use crate::prompt::{assemble_system_prompt, ChatMessage};
use crate::reasoning::create_reasoning_schema;
use crate::strict::to_strict_schema;
use crate::types::{json_type_name, ExtensionKey};

/// Name used in `response_format` when the schema has no usable title.
pub const DEFAULT_FORMAT_NAME: &str = "extraction";

/// A typed model that can describe itself as a JSON Schema.
///
/// Implementations supply the schema plus optional prompt side channels,
/// which are written onto the schema as extension attributes when the
/// façade is built.
pub trait ModelSchema {
    /// The model's JSON Schema.
    fn json_schema(&self) -> Value;

    /// Custom system prompt for the root.
    fn system_prompt(&self) -> Option<String> {
        None
    }

    /// Reasoning hints as `(pattern, prompt)` pairs.
    fn reasoning_prompts(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

#[derive(Debug)]
struct ModelParts {
    schema: Value,
    system_prompt: Option<String>,
    reasoning_prompts: Vec<(String, String)>,
}

/// Builds a [`Schema`] from a raw JSON Schema or a [`ModelSchema`].
///
/// A raw schema takes precedence when both are supplied.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    raw: Option<Value>,
    model: Option<ModelParts>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json_schema(mut self, schema: Value) -> Self {
        self.raw = Some(schema);
        self
    }

    pub fn model<M: ModelSchema + ?Sized>(mut self, model: &M) -> Self {
        self.model = Some(ModelParts {
            schema: model.json_schema(),
            system_prompt: model.system_prompt(),
            reasoning_prompts: model.reasoning_prompts(),
        });
        self
    }

    /// # Errors
    ///
    /// `SchemaError::MissingSource` when neither source was supplied, or
    /// `SchemaError::InvalidRoot` when the schema is not an object.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(raw) = self.raw {
            return Schema::new(raw);
        }
        let Some(model) = self.model else {
            return Err(SchemaError::MissingSource);
        };

        let mut schema = Schema::new(model.schema)?;
        if let Some(prompt) = model.system_prompt {
            schema.set("", ExtensionKey::SystemPrompt, prompt);
        }
        for (pattern, prompt) in model.reasoning_prompts {
            schema.set(&pattern, ExtensionKey::ReasoningPrompt, prompt);
        }
        Ok(schema)
    }
}

/// An extraction schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Value,
}

impl Schema {
    /// Wrap a JSON Schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidRoot` if the root is not a JSON object.
    pub fn new(root: Value) -> Result<Self, SchemaError> {
        if !root.is_object() {
            return Err(SchemaError::InvalidRoot {
                actual: json_type_name(&root).to_string(),
            });
        }
        Ok(Self { root })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Load a schema file.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        Self::new(load_schema(path)?)
    }

    /// The live root, including extension attributes.
    pub fn json_schema(&self) -> &Value {
        &self.root
    }

    pub fn into_json_schema(self) -> Value {
        self.root
    }

    /// The root's `title`, if any.
    pub fn title(&self) -> Option<&str> {
        self.root.get("title").and_then(Value::as_str)
    }

    /// The schema without extension attributes.
    pub fn public_json_schema(&self) -> Value {
        strip_extensions(&self.root)
    }

    /// The schema with local references inlined.
    pub fn expanded_schema(&self) -> Result<Value, SchemaError> {
        expand_refs(&self.root)
    }

    /// The expanded schema with reasoning fields added.
    pub fn reasoning_schema(&self) -> Result<Value, SchemaError> {
        Ok(create_reasoning_schema(&self.expanded_schema()?))
    }

    /// Strict schema for structured-output inference.
    pub fn inference_json_schema(&self) -> Result<Value, SchemaError> {
        to_strict_schema(&self.reasoning_schema()?)
    }

    /// Typed interface of the reasoning schema.
    pub fn typescript_interface(&self) -> Result<String, SchemaError> {
        Ok(typescript_interface(&self.reasoning_schema()?))
    }

    /// Natural-language outline of the reasoning schema.
    pub fn nlp_description(&self) -> Result<String, SchemaError> {
        Ok(nlp_description(&self.reasoning_schema()?))
    }

    pub fn system_prompt(&self) -> Result<String, SchemaError> {
        Ok(assemble_system_prompt(&self.root, &self.reasoning_schema()?))
    }

    /// Chat messages to send ahead of the content: a single system message.
    pub fn messages(&self) -> Result<Vec<ChatMessage>, SchemaError> {
        Ok(vec![ChatMessage::system(self.system_prompt()?)])
    }

    /// Structured-output request fragment wrapping the strict schema.
    pub fn response_format(&self) -> Result<Value, SchemaError> {
        Ok(json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.format_name(),
                "schema": self.inference_json_schema()?,
                "strict": true
            }
        }))
    }

    pub fn id(&self) -> String {
        schema_id(&self.root)
    }

    pub fn data_id(&self) -> String {
        schema_data_id(&self.root)
    }

    /// Read an extension attribute by pattern.
    pub fn get(&self, pattern: &str, key: ExtensionKey) -> Option<String> {
        get_pattern_attribute(&self.root, pattern, key)
    }

    /// Write an extension attribute by pattern. Returns `false` on a miss.
    pub fn set(&mut self, pattern: &str, key: ExtensionKey, value: impl Into<String>) -> bool {
        set_pattern_attribute(&mut self.root, pattern, key, value)
    }

    pub fn remove(&mut self, pattern: &str, key: ExtensionKey) -> Option<String> {
        remove_pattern_attribute(&mut self.root, pattern, key)
    }

    fn format_name(&self) -> String {
        let name: String = self
            .title()
            .unwrap_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .take(64)
            .collect();
        if name.trim_matches('_').is_empty() {
            DEFAULT_FORMAT_NAME.to_string()
        } else {
            name
        }
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(load_schema_str(s)?)
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

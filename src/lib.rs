//! Extraction Schema Compiler
//!
//! Compiles annotated JSON Schemas into the artefacts an LLM extraction call
//! needs: a strict structured-output schema, a system prompt describing the
//! expected output, and content-derived identifiers for caching.
//!
//! # Example
//!
//! ```
//! use extraction_schema::{ExtensionKey, Schema};
//! use serde_json::json;
//!
//! let mut schema = Schema::new(json!({
//!     "title": "Invoice",
//!     "type": "object",
//!     "properties": {
//!         "number": { "type": "string" },
//!         "status": { "type": "integer", "enum": [1, 2, 3] }
//!     },
//!     "required": ["number"]
//! }))
//! .unwrap();
//!
//! schema.set("number", ExtensionKey::ReasoningPrompt, "Where is the number printed?");
//!
//! let strict = schema.inference_json_schema().unwrap();
//! assert_eq!(strict["additionalProperties"], false);
//! assert_eq!(strict["properties"]["status"]["enum"], json!(["1", "2", "3"]));
//! assert_eq!(
//!     strict["properties"]["reasoning___number"]["description"],
//!     "Where is the number printed?"
//! );
//!
//! let prompt = schema.system_prompt().unwrap();
//! assert!(prompt.contains("interface Invoice {"));
//! ```
//!
//! # Pipeline
//!
//! | Stage                         | Function                    |
//! |-------------------------------|-----------------------------|
//! | Inline local references       | [`expand_refs`]             |
//! | Add reasoning fields          | [`create_reasoning_schema`] |
//! | Lower to strict mode          | [`to_strict_schema`]        |
//! | Drop extension attributes     | [`clean_schema`]            |
//! | Render typed interface        | [`typescript_interface`]    |
//! | Render natural language       | [`nlp_description`]         |
//! | Assemble the system prompt    | [`assemble_system_prompt`]  |
//! | Derive identifiers            | [`schema_id`], [`schema_data_id`] |
//!
//! # Extension Attributes
//!
//! Keys prefixed with `X-` carry prompt-authoring metadata and never reach
//! the strict or public schema:
//!
//! ```json
//! {
//!   "type": "object",
//!   "X-SystemPrompt": "You read supplier invoices.",
//!   "properties": {
//!     "total": { "type": "number", "X-ReasoningPrompt": "Show how the total adds up." }
//!   }
//! }
//! ```

mod annotation;
mod clean;
mod cycle;
mod describe;
mod error;
mod expand;
mod identity;
mod interface;
mod linter;
mod loader;
mod prompt;
mod reasoning;
mod schema;
mod strict;
mod types;

pub use annotation::{
    get_pattern_attribute, remove_pattern_attribute, resolve_pattern, set_pattern_attribute,
};
pub use clean::{clean_schema, strip_extensions, CleanOptions};
pub use cycle::has_cycle;
pub use describe::nlp_description;
pub use error::SchemaError;
pub use expand::expand_refs;
pub use identity::{canonical_json, schema_data_id, schema_id, DATA_ID_IGNORED_KEYWORDS};
pub use interface::{type_name, typescript_interface};
pub use linter::{
    lint, lint_file, lint_schema, Diagnostic, FileResult, FileStatus, LintResult, Severity,
};
pub use loader::{definitions, load_schema, load_schema_str, navigate_fragment};
pub use prompt::{assemble_system_prompt, ChatMessage, EXTRACTION_PREAMBLE};
pub use reasoning::{create_reasoning_schema, reasoning_key};
pub use schema::{ModelSchema, Schema, SchemaBuilder};
pub use strict::{stringify_enum_value, to_strict_schema};
pub use types::{
    ExtensionKey, EXTENSION_PREFIX, ITEM_REASONING_KEY, REASONING_PREFIX, ROOT_REASONING_KEY,
};

//! System prompt assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::describe::nlp_description;
use crate::interface::typescript_interface;
use crate::types::{extension_str, ExtensionKey};

/// Instructions shared by every extraction prompt.
pub const EXTRACTION_PREAMBLE: &str = "\
You are an expert data extraction system. Extract the requested information from the provided content and answer with a single JSON object that follows the schema described below.

## Output rules

- Encoding: write UTF-8 text only. Keep accented letters, symbols and non-Latin scripts as they appear; never emit escape sequences or characters from other encodings.
- Dates and times: use ISO 8601. Dates are YYYY-MM-DD, date-times are YYYY-MM-DDTHH:MM:SS with the timezone offset when the content states one. When no timezone is given, assume UTC and append \"Z\".
- Missing values: every field must be present. Use null for a value the content does not provide. For a nested object, return null only when none of its fields can be found; otherwise return the object with its missing fields set to null.
- Reasoning fields: a field named reasoning___<field> holds your step-by-step justification for <field>, reasoning___item justifies one array item and reasoning___root justifies the document as a whole. Write each reasoning field before the value it explains and keep it factual.
- Quotes and sources: a field whose name or description asks for a quote, excerpt or source must contain the exact text copied verbatim from the content, including its original spelling and punctuation. Never paraphrase, translate or correct it.";

/// A chat message in the role/content shape used by chat-completion APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// The root's custom system prompt, or an empty string.
pub fn custom_system_prompt(schema: &Value) -> &str {
    schema
        .as_object()
        .and_then(|map| extension_str(map, ExtensionKey::SystemPrompt))
        .unwrap_or("")
}

/// Schema description block: natural-language outline, then the interface.
pub fn schema_description(reasoning_schema: &Value) -> String {
    format!(
        "## Expected output\n\n{}\n\n```typescript\n{}\n```",
        nlp_description(reasoning_schema),
        typescript_interface(reasoning_schema)
    )
}

/// Assemble the full system prompt.
///
/// `schema` supplies the custom system prompt (`X-SystemPrompt` on the root);
/// `reasoning_schema` is the expanded, reasoning-augmented view that gets
/// rendered. The parts are joined by blank lines in a fixed order, so an
/// absent custom prompt leaves an empty section.
pub fn assemble_system_prompt(schema: &Value, reasoning_schema: &Value) -> String {
    let description = schema_description(reasoning_schema);
    [
        EXTRACTION_PREAMBLE,
        custom_system_prompt(schema),
        description.as_str(),
    ]
    .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_sections_are_in_order() {
        let schema = json!({
            "type": "object",
            "X-SystemPrompt": "Focus on the supplier.",
            "properties": { "name": { "type": "string" } }
        });
        let prompt = assemble_system_prompt(&schema, &schema);

        let preamble = prompt.find("## Output rules").unwrap();
        let custom = prompt.find("Focus on the supplier.").unwrap();
        let outline = prompt.find("Root: object containing:").unwrap();
        let interface = prompt.find("interface RootSchema {").unwrap();
        assert!(preamble < custom && custom < outline && outline < interface);
        assert!(prompt.starts_with(EXTRACTION_PREAMBLE));
        assert!(prompt.ends_with("}\n```"));
    }

    #[test]
    fn missing_custom_prompt_leaves_empty_section() {
        let schema = json!({ "type": "object" });
        let prompt = assemble_system_prompt(&schema, &schema);
        assert_eq!(
            prompt,
            format!(
                "{}\n\n\n\n## Expected output\n\nRoot: object with no fixed fields\n\n```typescript\ninterface RootSchema {{}}\n```",
                EXTRACTION_PREAMBLE
            )
        );
    }

    #[test]
    fn preamble_covers_conventions() {
        for needle in ["UTF-8", "ISO 8601", "UTC", "null", "reasoning___", "verbatim"] {
            assert!(EXTRACTION_PREAMBLE.contains(needle), "missing {}", needle);
        }
    }

    #[test]
    fn non_string_system_prompt_is_ignored() {
        let schema = json!({ "X-SystemPrompt": 42 });
        assert_eq!(custom_system_prompt(&schema), "");
    }
}

//! Error types for schema loading and compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a [`Schema`](crate::Schema) or compiling its views.
#[derive(Debug, Error)]
pub enum SchemaError {
    // Construction errors (exit code 2)
    #[error("no schema source: supply either a JSON Schema or a model implementing ModelSchema")]
    MissingSource,

    #[error("invalid schema root: expected object, got {actual}")]
    InvalidRoot { actual: String },

    // Compilation errors (exit code 2)
    #[error("allOf at {path} must have exactly one entry, found {count}: {node}")]
    MalformedIntersection {
        path: String,
        count: usize,
        node: String,
    },

    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SchemaError::FileNotFound { .. } | SchemaError::ReadError { .. } => 3,
            _ => 2,
        }
    }

    pub(crate) fn malformed_intersection(
        path: &str,
        count: usize,
        node: &serde_json::Value,
    ) -> Self {
        SchemaError::MalformedIntersection {
            path: if path.is_empty() { "#".to_string() } else { format!("#{}", path) },
            count,
            node: node.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_error_exit_codes() {
        let err = SchemaError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = SchemaError::MissingSource;
        assert_eq!(err.exit_code(), 2);

        let err = SchemaError::InvalidRoot {
            actual: "array".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn malformed_intersection_carries_node() {
        let node = json!({ "allOf": [] });
        let err = SchemaError::malformed_intersection("", 0, &node);
        assert_eq!(
            err.to_string(),
            r#"allOf at # must have exactly one entry, found 0: {"allOf":[]}"#
        );

        let err = SchemaError::malformed_intersection("/properties/a", 2, &node);
        assert!(err.to_string().starts_with("allOf at #/properties/a"));
    }
}

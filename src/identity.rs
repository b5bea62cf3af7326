//! Content-addressed schema identity.
//!
//! Both identifiers are SHA-256 digests of canonical JSON: object keys sorted
//! recursively, compact serialization. `schema_id` covers the whole schema,
//! extension attributes included. `schema_data_id` covers only the data shape:
//! extensions and descriptive keywords are removed first, so rewording a
//! prompt or a description keeps the data id stable.

use sha2::{Digest, Sha256};
use serde_json::{Map, Value};

use crate::clean::{clean_schema, CleanOptions};

pub const SCHEMA_ID_PREFIX: &str = "sch_id_";
pub const DATA_ID_PREFIX: &str = "sch_data_id_";

/// Keywords ignored by the data id.
pub const DATA_ID_IGNORED_KEYWORDS: &[&str] = &[
    "description",
    "default",
    "title",
    "required",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// Identity of the full schema.
pub fn schema_id(schema: &Value) -> String {
    let cleaned = clean_schema(schema, &CleanOptions::new());
    format!("{}{}", SCHEMA_ID_PREFIX, digest(&cleaned))
}

/// Identity of the data shape described by the schema.
pub fn schema_data_id(schema: &Value) -> String {
    let options = CleanOptions::new()
        .remove_extensions(true)
        .remove_keywords(DATA_ID_IGNORED_KEYWORDS.iter().copied());
    let cleaned = clean_schema(schema, &options);
    format!("{}{}", DATA_ID_PREFIX, digest(&cleaned))
}

/// Serialize with recursively sorted object keys.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn digest(value: &Value) -> String {
    let hash = Sha256::digest(canonical_json(value).as_bytes());
    format!("{:x}", hash)
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

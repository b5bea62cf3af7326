//! Schema linting - static analysis of extraction schema files.
//!
//! Reports problems that would make compilation fail or behave unexpectedly:
//! - JSON syntax errors and non-object roots
//! - Root `allOf` that expansion cannot merge
//! - Local `$ref` pointers that do not resolve
//! - Extension attributes with invalid values, unknown names or misplaced
//!   system prompts
//! - Cyclic definitions (expansion is skipped for them)
//! - Property names that collide with generated reasoning fields

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cycle::has_cycle;
use crate::loader::{escape_pointer, load_schema, navigate_fragment};
use crate::types::{is_extension_key, json_type_name, ExtensionKey, REASONING_PREFIX};

/// Keywords whose values map names to subschemas.
const NAMED_SCHEMA_KEYWORDS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// Keywords holding instance data rather than subschemas.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "examples"];

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/total/X-FieldPrompt")
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, code: &str, path: &str, message: String) -> Self {
        Self {
            severity,
            code: code.to_string(),
            file: PathBuf::new(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            message,
        }
    }
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result.diagnostics, Severity::Error);
        total_warnings += count(&file_result.diagnostics, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let mut diagnostics = match load_schema(file) {
        Ok(schema) => lint_schema(&schema),
        Err(e) => vec![Diagnostic::new(
            Severity::Error,
            "E001",
            "",
            format!("cannot load schema: {}", e),
        )],
    };
    for diagnostic in &mut diagnostics {
        diagnostic.file = file.to_path_buf();
    }

    let status = if count(&diagnostics, Severity::Error) > 0 {
        FileStatus::Error
    } else if count(&diagnostics, Severity::Warning) > 0 {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

/// Lint an in-memory schema. Diagnostics carry an empty `file`.
pub fn lint_schema(schema: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let Value::Object(map) = schema else {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "E002",
            "",
            format!("schema root must be an object, got {}", json_type_name(schema)),
        ));
        return diagnostics;
    };

    if let Some(all_of) = map.get("allOf") {
        let mergeable = matches!(all_of, Value::Array(members) if members.len() == 1 && members[0].is_object());
        if !mergeable {
            let count = all_of.as_array().map_or(0, Vec::len);
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "E003",
                "/allOf",
                format!("root allOf must have exactly one object entry, found {}", count),
            ));
        }
    }

    if has_cycle(schema) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "W002",
            "",
            "schema is recursive; references will not be expanded".to_string(),
        ));
    }

    check_node(schema, "", schema, &mut diagnostics);
    diagnostics
}

/// Recursively check a schema node.
fn check_node(node: &Value, path: &str, root: &Value, diagnostics: &mut Vec<Diagnostic>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                check_ref(reference, path, root, diagnostics);
            }

            for (key, value) in map {
                let child_path = format!("{}/{}", path, escape_pointer(key));
                if is_extension_key(key) {
                    check_extension(key, value, path, &child_path, diagnostics);
                } else if NAMED_SCHEMA_KEYWORDS.contains(&key.as_str()) {
                    check_named(key, value, &child_path, root, diagnostics);
                } else if !DATA_KEYWORDS.contains(&key.as_str()) {
                    check_node(value, &child_path, root, diagnostics);
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_node(item, &child_path, root, diagnostics);
            }
        }
        _ => {}
    }
}

/// Check the entries of `properties`, `$defs` and similar name maps.
fn check_named(
    keyword: &str,
    value: &Value,
    path: &str,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Value::Object(entries) = value else {
        return;
    };
    for (name, schema) in entries {
        let entry_path = format!("{}/{}", path, escape_pointer(name));
        if keyword == "properties" && name.starts_with(REASONING_PREFIX) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "W003",
                &entry_path,
                format!(
                    "property \"{}\" uses the reserved prefix {}; no reasoning field is generated for it",
                    name, REASONING_PREFIX
                ),
            ));
        }
        check_node(schema, &entry_path, root, diagnostics);
    }
}

/// Check a local `$ref` resolves.
fn check_ref(reference: &str, path: &str, root: &Value, diagnostics: &mut Vec<Diagnostic>) {
    // Non-local references are left alone by expansion
    if !reference.starts_with('#') || reference == "#" {
        return;
    }
    if navigate_fragment(root, reference).is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "E004",
            &format!("{}/$ref", path),
            format!("reference not found: {}", reference),
        ));
    }
}

/// Check a single extension attribute.
fn check_extension(
    key: &str,
    value: &Value,
    node_path: &str,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(extension) = ExtensionKey::parse(key) else {
        let known: Vec<&str> = ExtensionKey::ALL.iter().map(|k| k.as_str()).collect();
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "W001",
            path,
            format!("unknown extension \"{}\": expected {}", key, known.join(", ")),
        ));
        return;
    };

    if !value.is_string() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "E005",
            path,
            format!(
                "invalid {} value type: expected string, got {}",
                key,
                json_type_name(value)
            ),
        ));
    }

    if extension == ExtensionKey::SystemPrompt && !node_path.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "W004",
            path,
            format!("{} is only read from the schema root", key),
        ));
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

/// Every schema file under `path`, in path order.
///
/// A file argument yields itself; directories are walked with a work stack.
/// Unreadable directories are logged and skipped.
fn schema_files(path: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(next) = pending.pop() {
        if next.is_dir() {
            match std::fs::read_dir(&next) {
                Ok(entries) => pending.extend(entries.filter_map(Result::ok).map(|e| e.path())),
                Err(e) => debug!(dir = %next.display(), error = %e, "skipping unreadable directory"),
            }
        } else if is_schema_file(&next) {
            found.push(next);
        }
    }
    found.sort();
    found
}

fn is_schema_file(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == "json")
}

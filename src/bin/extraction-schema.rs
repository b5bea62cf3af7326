//! Extraction Schema CLI
//!
//! Command-line interface for compiling, inspecting and linting extraction schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use extraction_schema::{
    lint, Diagnostic, ExtensionKey, FileResult, FileStatus, LintResult, Schema, SchemaError,
    Severity,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "extraction-schema")]
#[command(about = "Compile annotated JSON Schemas into extraction prompts and strict schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Schema file
    schema: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inline local $ref pointers
    Expand(Source),

    /// Expand and add reasoning fields
    Reasoning(Source),

    /// Compile the strict structured-output schema
    Strict(Source),

    /// Strip extension attributes
    Public(Source),

    /// Render the typed interface
    Interface(Source),

    /// Render the natural-language description
    Describe(Source),

    /// Assemble the system prompt
    Prompt(Source),

    /// Print the schema id and data id
    Id(Source),

    /// Read an extension attribute by pattern
    Get {
        #[command(flatten)]
        source: Source,

        /// Node pattern (e.g. "lines[].sku"; empty for the root)
        pattern: String,

        /// Extension key (e.g. X-FieldPrompt)
        key: ExtensionKey,
    },

    /// Write an extension attribute by pattern and print the updated schema
    Set {
        #[command(flatten)]
        source: Source,

        /// Node pattern (e.g. "lines[].sku"; empty for the root)
        pattern: String,

        /// Extension key (e.g. X-FieldPrompt)
        key: ExtensionKey,

        /// Attribute value
        value: String,
    },

    /// Lint schema files for errors (syntax, broken refs, invalid extensions)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Report format
        #[arg(long, value_enum, default_value_t = LintFormat::Text)]
        format: LintFormat,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LintFormat {
    /// One `file:path: severity[code] message` line per diagnostic
    Text,
    /// The full lint result as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Expand(source) => run_json(&source, |s| s.expanded_schema()),
        Commands::Reasoning(source) => run_json(&source, |s| s.reasoning_schema()),
        Commands::Strict(source) => run_json(&source, |s| s.inference_json_schema()),
        Commands::Public(source) => run_json(&source, |s| Ok(s.public_json_schema())),
        Commands::Id(source) => {
            run_json(&source, |s| Ok(json!({ "id": s.id(), "data_id": s.data_id() })))
        }
        Commands::Interface(source) => run_text(&source, |s| s.typescript_interface()),
        Commands::Describe(source) => run_text(&source, |s| s.nlp_description()),
        Commands::Prompt(source) => run_text(&source, |s| s.system_prompt()),
        Commands::Get {
            source,
            pattern,
            key,
        } => run_get(&source, &pattern, key),
        Commands::Set {
            source,
            pattern,
            key,
            value,
        } => run_set(&source, &pattern, key, value),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load(source: &Source) -> Result<Schema, u8> {
    Schema::from_path(&source.schema).map_err(report)
}

fn report(e: SchemaError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn run_json<F>(source: &Source, view: F) -> Result<(), u8>
where
    F: FnOnce(&Schema) -> Result<Value, SchemaError>,
{
    let schema = load(source)?;
    let value = view(&schema).map_err(report)?;
    write_json(&value, source)
}

fn run_text<F>(source: &Source, view: F) -> Result<(), u8>
where
    F: FnOnce(&Schema) -> Result<String, SchemaError>,
{
    let schema = load(source)?;
    let text = view(&schema).map_err(report)?;
    write_output(&text, source.output.as_deref())
}

fn run_get(source: &Source, pattern: &str, key: ExtensionKey) -> Result<(), u8> {
    let schema = load(source)?;
    match schema.get(pattern, key) {
        Some(value) => write_output(&value, source.output.as_deref()),
        None => {
            eprintln!("No {} at pattern \"{}\"", key, pattern);
            Err(1)
        }
    }
}

fn run_set(source: &Source, pattern: &str, key: ExtensionKey, value: String) -> Result<(), u8> {
    let mut schema = load(source)?;
    if !schema.set(pattern, key, value) {
        eprintln!("Error: pattern \"{}\" matched no schema node", pattern);
        return Err(2);
    }
    write_json(schema.json_schema(), source)
}

fn write_json(value: &Value, source: &Source) -> Result<(), u8> {
    let json_output = if source.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(&json_output, source.output.as_deref())
}

fn write_output(text: &str, output: Option<&Path>) -> Result<(), u8> {
    match output {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", text);
        }
    }

    Ok(())
}

fn run_lint(path: &Path, format: LintFormat, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);
    let failed = !result.is_ok() || (strict && result.warnings > 0);

    match format {
        LintFormat::Json => {
            let report = serde_json::to_string_pretty(&result).map_err(|e| {
                eprintln!("Error serializing output: {}", e);
                2u8
            })?;
            println!("{}", report);
        }
        LintFormat::Text => print!("{}", lint_report(&result, failed, quiet)),
    }

    if failed {
        Err(1)
    } else {
        Ok(())
    }
}

/// Render a text lint report: one line per diagnostic, then a summary.
///
/// Quiet mode keeps only errors and prints the summary only on failure.
fn lint_report(result: &LintResult, failed: bool, quiet: bool) -> String {
    let mut report = String::new();
    for file in &result.results {
        for diagnostic in &file.diagnostics {
            if quiet && diagnostic.severity != Severity::Error {
                continue;
            }
            report.push_str(&diagnostic_line(file, diagnostic));
            report.push('\n');
        }
    }

    if failed {
        let files = result
            .results
            .iter()
            .filter(|f| f.status != FileStatus::Ok)
            .count();
        report.push_str(&format!(
            "{} of {} schema files need attention: {} errors, {} warnings\n",
            files, result.files_checked, result.errors, result.warnings
        ));
    } else if !quiet {
        report.push_str(&format!(
            "{} schema files, all passed ({} warnings)\n",
            result.files_checked, result.warnings
        ));
    }
    report
}

fn diagnostic_line(file: &FileResult, diagnostic: &Diagnostic) -> String {
    // Linting a single file leaves an empty relative name
    let name = if file.file.as_os_str().is_empty() {
        diagnostic.file.display()
    } else {
        file.file.display()
    };
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "{}:{}: {}[{}] {}",
        name, diagnostic.path, severity, diagnostic.code, diagnostic.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with(diagnostics: Vec<Diagnostic>) -> LintResult {
        let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
        let warnings = diagnostics.len() - errors;
        let status = if errors > 0 {
            FileStatus::Error
        } else if warnings > 0 {
            FileStatus::Warning
        } else {
            FileStatus::Ok
        };
        LintResult {
            path: PathBuf::from("schemas"),
            files_checked: 1,
            passed: usize::from(errors == 0),
            failed: usize::from(errors > 0),
            errors,
            warnings,
            results: vec![FileResult {
                file: PathBuf::from("invoice.json"),
                status,
                diagnostics,
            }],
        }
    }

    fn diagnostics_for(schema: Value) -> Vec<Diagnostic> {
        extraction_schema::lint_schema(&schema)
            .into_iter()
            .map(|mut d| {
                d.file = PathBuf::from("schemas/invoice.json");
                d
            })
            .collect()
    }

    #[test]
    fn report_lists_each_diagnostic_on_one_line() {
        let result = result_with(diagnostics_for(json!({
            "type": "object",
            "X-Owner": "billing",
            "properties": { "a": { "$ref": "#/$defs/Missing" } }
        })));
        let report = lint_report(&result, true, false);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("invoice.json:/X-Owner: warning[W001] unknown extension"));
        assert_eq!(
            lines[1],
            "invoice.json:/properties/a/$ref: error[E004] reference not found: #/$defs/Missing"
        );
        assert_eq!(lines[2], "1 of 1 schema files need attention: 1 errors, 1 warnings");
    }

    #[test]
    fn quiet_report_keeps_errors_only() {
        let warnings_only = result_with(diagnostics_for(json!({ "type": "object", "X-Owner": "x" })));
        assert_eq!(lint_report(&warnings_only, false, true), "");

        let report = lint_report(&warnings_only, false, false);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("warning[W001]"));
        assert_eq!(lines[1], "1 schema files, all passed (1 warnings)");
    }

    #[test]
    fn single_file_report_uses_full_path() {
        let mut result = result_with(diagnostics_for(json!([1])));
        result.results[0].file = PathBuf::new();
        let report = lint_report(&result, true, false);
        assert!(report.starts_with("schemas/invoice.json:/: error[E002]"));
    }
}

//! CLI integration tests for extraction-schema binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("extraction-schema"))
}

// Helper to create a temp schema file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const INVOICE: &str = r##"{
    "title": "Invoice",
    "type": "object",
    "X-SystemPrompt": "You read supplier invoices.",
    "properties": {
        "number": { "type": "string", "X-ReasoningPrompt": "Where is it printed?" },
        "status": { "type": "integer", "enum": [1, 2] },
        "supplier": { "$ref": "#/$defs/Party" }
    },
    "required": ["number"],
    "$defs": {
        "Party": { "type": "object", "properties": { "name": { "type": "string" } } }
    }
}"##;

mod compile_commands {
    use super::*;

    #[test]
    fn expand_inlines_definitions() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["expand", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""supplier":{"type":"object","properties":{"name":{"type":"string"}}}"#,
            ))
            .stdout(predicate::str::contains("$defs").not());
    }

    #[test]
    fn reasoning_adds_fields() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["reasoning", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""reasoning___number":{"type":"string","description":"Where is it printed?"}"#,
            ))
            .stdout(predicate::str::contains(r#""required":["number","reasoning___number"]"#));
    }

    #[test]
    fn strict_closes_objects() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["strict", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""additionalProperties":false"#))
            .stdout(predicate::str::contains(r#""enum":["1","2"]"#))
            .stdout(predicate::str::contains("X-").not());
    }

    #[test]
    fn strict_with_pretty() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["strict", schema.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            // Pretty output has newlines and indentation
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn strict_with_output_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);
        let output = dir.path().join("strict.json");

        cmd()
            .args([
                "strict",
                schema.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["additionalProperties"], false);
    }

    #[test]
    fn public_strips_extensions() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["public", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("X-").not())
            .stdout(predicate::str::contains("$defs"));
    }

    #[test]
    fn malformed_root_intersection_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "bad.json",
            r#"{"allOf": [{"type": "object"}, {"type": "object"}]}"#,
        );

        cmd()
            .args(["expand", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("allOf at # must have exactly one entry"));
    }

    #[test]
    fn cyclic_schema_is_passed_through() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "tree.json",
            r##"{"type":"object","properties":{"child":{"$ref":"#"}}}"##,
        );

        cmd()
            .args(["expand", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r##""child":{"$ref":"#"}"##))
            .stderr(predicate::str::contains("cycle detected"));
    }
}

mod render_commands {
    use super::*;

    #[test]
    fn interface_renders_reasoning_schema() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["interface", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("interface Invoice {"))
            .stdout(predicate::str::contains("  number: string;"))
            .stdout(predicate::str::contains("  status?: \"1\" | \"2\";").not())
            .stdout(predicate::str::contains("  status?: 1 | 2;"));
    }

    #[test]
    fn describe_renders_outline() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["describe", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Invoice: object containing:"))
            .stdout(predicate::str::contains("- status: one of: 1, 2"));
    }

    #[test]
    fn prompt_includes_custom_prompt() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["prompt", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("You read supplier invoices."))
            .stdout(predicate::str::contains("```typescript"));
    }

    #[test]
    fn id_prints_both_identifiers() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["id", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""id":"sch_id_"#))
            .stdout(predicate::str::contains(r#""data_id":"sch_data_id_"#));
    }
}

mod annotation_commands {
    use super::*;

    #[test]
    fn get_reads_attribute() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["get", schema.to_str().unwrap(), "number", "X-ReasoningPrompt"])
            .assert()
            .success()
            .stdout("Where is it printed?\n");

        cmd()
            .args(["get", schema.to_str().unwrap(), "", "X-SystemPrompt"])
            .assert()
            .success()
            .stdout("You read supplier invoices.\n");
    }

    #[test]
    fn get_missing_attribute_exits_1() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["get", schema.to_str().unwrap(), "status", "X-FieldPrompt"])
            .assert()
            .code(1);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["get", schema.to_str().unwrap(), "number", "X-Colour"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown extension key"));
    }

    #[test]
    fn set_writes_through_references() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args([
                "set",
                schema.to_str().unwrap(),
                "supplier.name",
                "X-FieldPrompt",
                "Legal name of the supplier",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""name":{"type":"string","X-FieldPrompt":"Legal name of the supplier"}"#,
            ));
    }

    #[test]
    fn set_on_missing_pattern_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["set", schema.to_str().unwrap(), "nope", "X-FieldPrompt", "x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("matched no schema node"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_valid_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "invoice.json", INVOICE);

        cmd()
            .args(["lint", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "broken.json",
            r##"{"type":"object","properties":{"a":{"$ref":"#/$defs/Missing"}}}"##,
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E004"));
    }

    #[test]
    fn lint_json_format() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "owner.json", r#"{"type":"object","X-Owner":"billing"}"#);

        cmd()
            .args(["lint", schema.to_str().unwrap(), "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""code": "W001""#));
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "owner.json", r#"{"type":"object","X-Owner":"billing"}"#);

        cmd()
            .args(["lint", schema.to_str().unwrap(), "--strict"])
            .assert()
            .code(1);
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/schemas"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["strict", "/nonexistent/schema.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "bad.json", "{ not json }");

        cmd()
            .args(["strict", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn non_object_root_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "list.json", "[1, 2]");

        cmd()
            .args(["describe", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("expected object, got array"));
    }
}

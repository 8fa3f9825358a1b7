use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

#[allow(deprecated)]
fn fieldspec() -> Command {
    Command::cargo_bin("fieldspec").expect("Failed to find fieldspec binary")
}

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_yaml_declarations() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invoices.yml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 3 field(s)"))
        .stdout(predicate::str::contains("str_startswith('INV-')"))
        .stdout(predicate::str::contains(
            "str_length(min_value=8, max_value=16)",
        ))
        .stdout(predicate::str::contains("greater_than_or_equal_to(0)"));
}

#[test]
fn test_check_regex_field_resolves_to_pattern() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invoices.yml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("col(\"^tax_.*$\")"))
        .stdout(predicate::str::contains("pattern selector"));
}

#[test]
fn test_check_toml_declarations() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invoices.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Currency"))
        .stdout(predicate::str::contains("isin(['EUR', 'USD', 'GBP'])"));
}

#[test]
fn test_check_json_output() {
    let output = fieldspec()
        .arg("check")
        .arg(fixture_path("invoices.yml"))
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to run fieldspec");

    assert!(output.status.success());
    let fields: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");

    assert_eq!(fields.as_array().unwrap().len(), 3);
    assert_eq!(fields[0]["name"], "invoice_id");
    assert_eq!(fields[0]["unique"], true);
    assert_eq!(fields[0]["checks"][0]["name"], "str_length");
    assert_eq!(fields[0]["checks"][1]["name"], "str_startswith");
    assert_eq!(fields[1]["checks"][0]["options"]["raise_warning"], true);
    assert_eq!(fields[2]["expression"], true);
}

#[test]
fn test_check_rejects_unknown_format() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invoices.yml"))
        .arg("--format")
        .arg("jsn")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'jsn'"));
}

#[test]
fn test_check_field_level_constraint_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("misplaced.yml");
    fs::write(&path, "fields:\n  - name: amount\n    gt: 0\n").unwrap();

    fieldspec()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field `gt`"));
}

#[test]
fn test_check_unknown_custom_check() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("custom_check.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("is_even"));
}

#[test]
fn test_check_registered_custom_check() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("custom_check.yml"))
        .arg("--custom")
        .arg("is_even")
        .assert()
        .success()
        .stdout(predicate::str::contains("greater_than(0)"))
        .stdout(predicate::str::contains("is_even(true)"));
}

#[test]
fn test_check_reserved_custom_name() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("custom_check.yml"))
        .arg("--custom")
        .arg("gt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("built-in"));
}

#[test]
fn test_check_invalid_argument() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invalid_argument.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("str_matches"));
}

#[test]
fn test_check_invalid_declaration() {
    fieldspec()
        .arg("check")
        .arg(fixture_path("invalid_declaration.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_missing_file() {
    fieldspec()
        .arg("check")
        .arg("nonexistent.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fields.json");
    fs::write(&path, "{}").unwrap();

    fieldspec()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_check_empty_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.yml");
    fs::write(&path, "fields: []\n").unwrap();

    fieldspec()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 0 field(s)"));
}

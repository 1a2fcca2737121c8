//! CLI integration tests
//!
//! These tests run the built binary against the schemas in `tests/fixtures`.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xsd-engine"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Validate Command Tests
// ============================================================================

#[test]
fn test_cli_validate_valid() {
    let output = run(&["validate", "--schema", &fixture("order.xsd"), &fixture("order_valid.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("order_valid.xml: valid"), "{}", stdout);
}

#[test]
fn test_cli_validate_invalid() {
    let output = run(&[
        "validate",
        "--schema",
        &fixture("order.xsd"),
        &fixture("order_valid.xml"),
        &fixture("order_invalid.xml"),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("/order/item/sku: error:"), "{}", stdout);
    assert!(stdout.contains("/order/item/quantity: error:"), "{}", stdout);
    assert!(stdout.contains("order_invalid.xml: invalid (2 error(s))"), "{}", stdout);
}

#[test]
fn test_cli_validate_json() {
    let output = run(&[
        "validate",
        "--json",
        "--schema",
        &fixture("order.xsd"),
        &fixture("order_invalid.xml"),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("Output should be valid JSON");

    assert_eq!(json["valid"], false);
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["diagnostics"][0]["severity"], "error");
}

#[test]
fn test_cli_validate_broken_schema() {
    let output = run(&["validate", "--schema", &fixture("broken.xsd"), &fixture("order_valid.xml")]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("unresolved reference"), "{}", stderr);
}

#[test]
fn test_cli_validate_missing_document() {
    let output = run(&["validate", "--schema", &fixture("order.xsd"), &fixture("absent.xml")]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect() {
    let output = run(&["inspect", &fixture("order.xsd")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "inspect should succeed");
    assert!(stdout.contains("xsd-engine"), "should show version");
    assert!(stdout.contains("urn:example:order"), "should show namespace");
    assert!(stdout.contains("Global Elements: 1"), "should show element count");
    assert!(stdout.contains("Global Types: 3"), "should show type count");
    assert!(stdout.contains("(simple)") && stdout.contains("(complex)"));
}

//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn datamapper_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_datamapper"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

// ============================================================================
// Map Command Tests
// ============================================================================

#[test]
fn test_cli_map_lead_conversion() {
    let output = Command::new(datamapper_bin())
        .args(["map", "--config", fixture("lead_mapping.json").as_str(), fixture("lead_input.json").as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "map should succeed");

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    let convert = &json["soapenv_Body"]["urn_convertLead"];
    assert_eq!(convert["urn_leadConverts"][0]["leadId"], "00Q1");
    assert_eq!(convert["urn_sendNotificationEmail"], true);
    assert_eq!(json["soapenv_Header"]["urn_SessionHeader"]["urn_sessionId"], "sess-1");
}

#[test]
fn test_cli_map_pretty_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("engineers.json");

    let output = Command::new(datamapper_bin())
        .args([
            "map",
            "--pretty",
            "--config",
            fixture("employee_mapping.json").as_str(),
            "--output",
            out_path.to_str().unwrap(),
            fixture("employee_input.json").as_str(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "map --output should succeed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Output written to"));

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.contains('\n'), "pretty output spans lines");
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["engineer"][0]["fullname"], "John Doe");
    assert_eq!(json["engineer"][0]["address"][1]["city"]["name"], "Kandy");
}

#[test]
fn test_cli_map_reports_first_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.json");
    std::fs::write(&input, r#"{"lead": [{"ID": 7, "name": "x"}], "sendNotificationEmail": "true", "overwriteLeadSource": "false", "sessionId": "s"}"#).unwrap();

    let output = Command::new(datamapper_bin())
        .args(["map", "--config", fixture("lead_mapping.json").as_str(), input.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "map should fail on invalid input");
    assert!(stderr.starts_with("Error: schema violation"));
    assert!(stderr.contains("/convertLeads/lead/0/ID"));
}

#[test]
fn test_cli_map_no_validate() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("loose.json");
    std::fs::write(&input, r#"{"lead": [], "extra": 1, "sendNotificationEmail": "true", "overwriteLeadSource": "false", "sessionId": "s"}"#).unwrap();

    let strict = Command::new(datamapper_bin())
        .args(["map", "--config", fixture("lead_mapping.json").as_str(), input.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(!strict.status.success());

    let loose = Command::new(datamapper_bin())
        .args(["map", "--no-validate", "--config", fixture("lead_mapping.json").as_str(), input.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(loose.status.success(), "--no-validate should skip shape checks");
}

// ============================================================================
// Check Command Tests
// ============================================================================

#[test]
fn test_cli_check() {
    let output = Command::new(datamapper_bin())
        .args(["check", "--config", fixture("employee_mapping.json").as_str()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "check should succeed");
    assert!(stdout.contains("Input root: employees"));
    assert!(stdout.contains("Namespaces: 1"));
    assert!(stdout.contains("Directives: 7"));
}

#[test]
fn test_cli_check_missing_file() {
    let output = Command::new(datamapper_bin())
        .args(["check", "--config", "/nonexistent/mapping.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

// ============================================================================
// Op Command Tests
// ============================================================================

#[test]
fn test_cli_op() {
    let output = Command::new(datamapper_bin())
        .args(["op", "concat", "John", "\" \"", "Doe"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "\"John Doe\"");

    let output = Command::new(datamapper_bin())
        .args(["op", "round", "-2.5"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "-3");
}

#[test]
fn test_cli_op_errors() {
    let output = Command::new(datamapper_bin())
        .args(["op", "toNumber", "abc"])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("operator error"));

    let output = Command::new(datamapper_bin())
        .args(["op", "explode"])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
}

//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn msim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_msim"))
        .args(args)
        .env_remove("MSIM_SEED")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute msim")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn generate_to(path: &Path) {
    let output = msim(&[
        "generate",
        "--points",
        "18",
        "--seed",
        "42",
        "--start",
        "2026-03-02T00:00:00Z",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "generate failed: {:?}", output);
}

#[test]
fn test_cli_help() {
    let output = msim(&["--help"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Server Metrics Simulator"), "Should show app name");
    for command in ["generate", "schedule", "interpolate", "stats", "validate"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

#[test]
fn test_cli_version() {
    let output = msim(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("msim"));
}

#[test]
fn test_generate_writes_jsonl() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.jsonl");
    generate_to(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    // 12 default servers * 18 points
    assert_eq!(content.lines().count(), 12 * 18);
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["timestamp"], "2026-03-02T00:00:00Z");
    assert!(first["serverId"].is_string());

    // Rerunning replaces rather than appends
    generate_to(&path);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_schedule_json_is_reproducible() {
    let args = ["--format", "json", "schedule", "--seed", "3", "--db", "3"];
    let first = msim(&args);
    let second = msim(&args);

    assert!(first.status.success());
    let preview: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(preview["seed"], 3);
    assert!(preview["events"].as_array().unwrap().len() >= 2);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_generate_rejects_oversized_class() {
    let output = msim(&["generate", "--worker", "51", "--points", "4"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("too many worker servers"));
}

#[test]
fn test_interpolate_stats_and_validate() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw.jsonl");
    let fine = dir.path().join("fine.jsonl");
    generate_to(&raw);

    let output = msim(&[
        "--format",
        "json",
        "interpolate",
        "--input",
        raw.to_str().unwrap(),
        "--output",
        fine.to_str().unwrap(),
        "--resolution",
        "2",
        "--seed",
        "1",
    ]);
    assert!(output.status.success(), "interpolate failed: {:?}", output);
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["outputRecords"], 12 * (17 * 4 + 18));
    assert_eq!(summary["isValid"], true);

    let output = msim(&["--format", "json", "stats", "--input", fine.to_str().unwrap()]);
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["interpolatedCount"], 12 * 17 * 4);

    let output = msim(&[
        "validate",
        "--original",
        raw.to_str().unwrap(),
        "--interpolated",
        fine.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("valid"));
}

#[test]
fn test_validate_fails_on_truncated_output() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw.jsonl");
    let short = dir.path().join("short.jsonl");
    generate_to(&raw);

    let content = std::fs::read_to_string(&raw).unwrap();
    let truncated: Vec<&str> = content.lines().take(10).collect();
    std::fs::write(&short, truncated.join("\n")).unwrap();

    let output = msim(&[
        "validate",
        "--original",
        raw.to_str().unwrap(),
        "--interpolated",
        short.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("quality check failed"));
}

#[test]
fn test_invalid_resolution_is_rejected() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw.jsonl");
    generate_to(&raw);

    let output = msim(&["interpolate", "--input", raw.to_str().unwrap(), "--resolution", "3"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be 1, 2 or 5"));
}

#[test]
fn test_verbose_logs_command_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.jsonl");

    let output = msim(&[
        "--verbose",
        "generate",
        "--points",
        "6",
        "--seed",
        "7",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Exported dataset"), "stderr: {}", stderr);

    let output = msim(&["--verbose", "stats", "--input", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Loaded dataset"));
}

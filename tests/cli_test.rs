//! Argument handling of the `batch-provision` binary.

use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_batch-provision"))
        .args(args)
        .env_remove("ACR_USERNAME")
        .env_remove("ACR_PASSWORD")
        .output()
        .expect("spawn batch-provision")
}

fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Usage: batch-provision <configfile>"));
}

#[test]
fn test_extra_arguments_skip_config_loading() {
    let output = run_cli(&["/nonexistent/a.json", "/nonexistent/b.json"]);
    let text = combined_output(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("Usage: batch-provision <configfile>"));
    assert!(!text.contains("Config file not found"));
}

#[test]
fn test_missing_config_file_fails() {
    let output = run_cli(&["/nonexistent/batch.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Error: load config failed: Config file not found: /nonexistent/batch.json"));
}

#[test]
fn test_missing_keys_are_listed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{"subscription": "Sub1", "rg": "rg1"}"#).expect("write config");

    let output = run_cli(&[path.to_str().expect("utf-8 path")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    for key in ["region", "acrserver", "acrimage", "acrimage_tag"] {
        assert!(stdout.contains(&format!("Missing key in config file: {key}")));
    }
    assert!(!stdout.contains("Missing key in config file: rg\n"));
}

#[test]
fn test_help_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
}

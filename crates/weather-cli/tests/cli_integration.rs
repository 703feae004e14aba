//! CLI Integration Tests
//!
//! These tests drive the `weather` binary against a temporary database.
//!
//! Run with:
//! ```
//! cargo test --package weather-cli --test cli_integration
//! ```

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Run weather against `db` with an empty config file.
fn run_weather(dir: &Path, args: &[&str]) -> Output {
    run_weather_with_stdin(dir, args, "")
}

fn run_weather_with_stdin(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_weather"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--db")
        .arg(dir.join("weather.db"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("WEATHER_DB")
        .env_remove("WEATHER_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run weather binary");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_weather(dir.path(), &["--help"]);

    assert!(output.status.success(), "Help should succeed");
    let text = stdout(&output);
    for command in ["ingest", "query", "delete", "logs"] {
        assert!(text.contains(command), "Help should list {}", command);
    }
}

#[test]
fn test_version_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_weather(dir.path(), &["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Store Tests
// =============================================================================

#[test]
fn test_ingest_stdin_then_query_csv() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_weather_with_stdin(dir.path(), &["ingest", "-t", "1000"], "21.4;47.9\n");
    assert!(output.status.success(), "{:?}", output);

    let output = run_weather(
        dir.path(),
        &["query", "--start", "1000", "--end", "1001", "-g", "raw", "-f", "csv"],
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "timestamp,temperature,humidity\n1000,21.4,47.9\n"
    );
}

#[test]
fn test_ingest_bad_line_fails_and_is_logged() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_weather(dir.path(), &["ingest", "-t", "1000", "Data not good, skip"]);
    assert!(!output.status.success());

    let output = run_weather(dir.path(), &["logs", "--severity", "warning", "-f", "csv"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("WARNING"));
}

#[test]
fn test_delete_and_fix_keep_rollups() {
    let dir = tempfile::tempdir().unwrap();

    for (ts, t) in [("7200", "10"), ("7260", "30"), ("7320", "20")] {
        let output = run_weather(dir.path(), &["save", "-t", ts, "-T", t, "-H", "50"]);
        assert!(output.status.success(), "{:?}", output);
    }

    let output = run_weather(dir.path(), &["delete", "7260"]);
    assert!(output.status.success());

    let output = run_weather(dir.path(), &["fix", "7320", "-T", "-2", "-H", "60"]);
    assert!(output.status.success());

    let output = run_weather(
        dir.path(),
        &["query", "--start", "0", "--end", "86400", "-g", "hour", "-f", "csv"],
    );
    let text = stdout(&output);
    let row = text.lines().nth(1).expect("one hourly row");
    assert_eq!(row, "7200,4,55,-2,10,50,60,2");
}

#[test]
fn test_query_inverted_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_weather(dir.path(), &["query", "--start", "2000", "--end", "1000"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[query]\nhour_threshold_secs = 10\nday_threshold_secs = 5\n",
    )
    .unwrap();

    let output = run_weather(dir.path(), &["stats"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation failed"));
}

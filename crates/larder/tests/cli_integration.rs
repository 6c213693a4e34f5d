//! CLI integration tests for the Larder command-line interface.
//!
//! Every test points the binary at a temporary config directory and runs
//! from a temporary working directory so no real user config is read.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the larder binary with isolated config discovery.
fn larder(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("larder").unwrap();
    cmd.current_dir(dir.path())
        .env("LARDER_CONFIG_DIR", dir.path().join("user"))
        .env_remove("LARDER_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    larder(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("soak"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    larder(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("larder"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    larder(&dir).arg("frobnicate").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    larder(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[cache]"))
        .stdout(predicate::str::contains("max_entries = 1000"))
        .stdout(predicate::str::contains("max_history_length = 100"));
}

#[test]
fn test_config_show_json_reflects_project_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("larder.toml"), "[session]\nmax_sessions = 12\n").unwrap();

    let output = larder(&dir)
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["session"]["max_sessions"], 12);
    assert_eq!(value["cache"]["default_ttl_secs"], 3600);
}

#[test]
fn test_config_flag_loads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[cache]\nmax_entries = 7\n").unwrap();

    larder(&dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_entries = 7"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("larder.toml"), "[cache]\nmax_entries = 0\n").unwrap();

    larder(&dir)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache.max_entries"));
}

#[test]
fn test_config_which_reports_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("larder.toml"), "").unwrap();

    larder(&dir)
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded").and(predicate::str::contains("larder.toml")))
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn test_config_init_local_refuses_overwrite() {
    let dir = TempDir::new().unwrap();

    larder(&dir)
        .args(["config", "init", "--local"])
        .assert()
        .success();
    assert!(dir.path().join("larder.toml").is_file());

    larder(&dir)
        .args(["config", "init", "--local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    larder(&dir)
        .args(["config", "init", "--local", "--force"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Soak Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_soak_json_report() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("larder.toml"),
        "[cache]\nmax_entries = 50\n\n[session]\nmax_sessions = 20\n",
    )
    .unwrap();

    let output = larder(&dir)
        .args(["--json", "soak", "--threads", "3", "--ops", "400"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["threads"], 3);
    assert!(report["cache"]["size"].as_u64().unwrap() <= 50);
    assert!(report["session"]["active_sessions"].as_u64().unwrap() <= 20);
    assert_eq!(report["session"]["total_created"], 3 * 50);
}

#[test]
fn test_soak_human_report() {
    let dir = TempDir::new().unwrap();
    larder(&dir)
        .args(["soak", "--threads", "2", "--ops", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hit rate"))
        .stdout(predicate::str::contains("Sessions"));
}

#[test]
fn test_soak_rejects_zero_threads() {
    let dir = TempDir::new().unwrap();
    larder(&dir)
        .args(["soak", "--threads", "0"])
        .assert()
        .failure();
}

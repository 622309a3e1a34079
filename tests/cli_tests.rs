//! Integration tests for the CLI interface
//!
//! Runs the real binary in an isolated directory so no user or project
//! configuration leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn opsdesk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("opsdesk").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("OPSDESK_API_URL")
        .env_remove("OPSDESK_USER_ID")
        .env_remove("OPSDESK_ENVIRONMENT")
        .env_remove("OPSDESK_AUTH_TOKEN")
        .env_remove("OPSDESK_CASCADE_DELAY_MS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_flag() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("tasks"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn test_cli_requires_a_subcommand() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_classify_requires_query() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .arg("classify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_missing_config_file_exits_with_config_code() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .args(["--config", "nowhere.toml", "tasks"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration problem"));
}

#[test]
fn test_invalid_config_value_exits_with_config_code() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("bad.toml"),
        "[api]\nbase_url = \"not a url\"\n",
    )
    .unwrap();
    opsdesk(&home)
        .args(["--config", "bad.toml", "tasks"])
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_backend_exits_with_transport_code() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .env("OPSDESK_API_URL", "http://127.0.0.1:9")
        .args(["classify", "free disk on web-1"])
        .assert()
        .code(3);
}

#[test]
fn test_invalid_cascade_delay_env_is_config_error() {
    let home = TempDir::new().unwrap();
    opsdesk(&home)
        .env("OPSDESK_CASCADE_DELAY_MS", "soon")
        .arg("tasks")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("OPSDESK_CASCADE_DELAY_MS"));
}

//! Tests for error handling, suggestions and exit codes.

use assert_cmd::{Command, cargo};
use predicates::prelude::*;
use tempfile::TempDir;

fn flagshift(dir: &TempDir) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("flagshift");
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env("FLAGSHIFT__STORE__DATA_DIR", dir.path().join("flags"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_error_invalid_flag_key_with_suggestions() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.json");
    std::fs::write(
        &file,
        r#"{"environment":"dev","version":"1.0.0","createdAt":"2026-01-01T00:00:00Z",
            "flags":{"Bad Key":{"type":"BOOLEAN","defaultValue":true}}}"#,
    )
    .unwrap();

    flagshift(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid flag key"))
        .stderr(predicate::str::contains("Suggestions:"));
}

#[test]
fn test_error_default_outside_range() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.json");
    std::fs::write(
        &file,
        r#"{"environment":"dev","version":"1.0.0","createdAt":"2026-01-01T00:00:00Z",
            "flags":{"a/n":{"type":"INTEGER","minValue":0,"maxValue":3,"defaultValue":7}}}"#,
    )
    .unwrap();

    flagshift(&dir)
        .arg("plan")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("a/n"));
}

#[test]
fn test_error_malformed_json_names_the_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();

    flagshift(&dir)
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.json"));
}

#[test]
fn test_error_missing_file() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir)
        .args(["plan", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_error_invalid_export_version() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir)
        .args(["export", "--version", "1.0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MAJOR.MINOR.PATCH"));
}

#[test]
fn test_error_unknown_config_key() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir)
        .args(["config", "get", "store.nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_error_missing_config_file() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir)
        .args(["--config", "nowhere.toml", "list"])
        .assert()
        .code(4);
}

#[test]
fn test_error_verbose_hint_only_without_verbose() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir)
        .args(["show", "a/ghost"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--verbose"));

    flagshift(&dir)
        .args(["-v", "show", "a/ghost"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Use -v / --verbose").not());
}

#[test]
fn test_error_bad_arguments_exit_two() {
    let dir = TempDir::new().unwrap();

    flagshift(&dir).args(["set", "a/b"]).assert().code(2);
}

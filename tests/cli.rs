//! Binary smoke tests for the varsnap CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_scope(dir: &TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn save_peek_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let scope = write_scope(&dir, "scope.json", r#"{"a": 1, "b": [2, 3], "_hidden": 0}"#);
    let snapshot = dir.path().join("lab1");

    Command::cargo_bin("varsnap")
        .unwrap()
        .args(["save"])
        .arg(&snapshot)
        .arg("--scope")
        .arg(&scope)
        .args(["--overwrite", "yes"])
        .assert()
        .success();
    assert!(dir.path().join("lab1.vars").exists());

    Command::cargo_bin("varsnap")
        .unwrap()
        .arg("peek")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("a,b"))
        .stdout(predicate::str::contains("_hidden").not());

    let target = write_scope(&dir, "target.json", r#"{"c": true}"#);
    Command::cargo_bin("varsnap")
        .unwrap()
        .arg("load")
        .arg(&snapshot)
        .arg("--scope")
        .arg(&target)
        .args(["--overwrite", "yes", "--no-warn"])
        .assert()
        .success();

    let merged: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(merged["a"], serde_json::json!(1));
    assert_eq!(merged["b"], serde_json::json!([2, 3]));
    assert_eq!(merged["c"], serde_json::json!(true));
}

#[test]
fn vars_lists_eligible_names() {
    let dir = TempDir::new().unwrap();
    let scope = write_scope(&dir, "scope.json", r#"{"a": 1, "_p": 2, "In": 3}"#);

    Command::cargo_bin("varsnap")
        .unwrap()
        .arg("vars")
        .arg("--scope")
        .arg(&scope)
        .assert()
        .success()
        .stdout(predicate::str::contains("variables: a"))
        .stdout(predicate::str::contains("In").not());
}

#[test]
fn load_missing_snapshot_fails() {
    let dir = TempDir::new().unwrap();
    let scope = write_scope(&dir, "scope.json", r#"{}"#);

    Command::cargo_bin("varsnap")
        .unwrap()
        .arg("load")
        .arg(dir.path().join("idontexist"))
        .arg("--scope")
        .arg(&scope)
        .args(["--overwrite", "yes", "--no-warn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn malformed_overwrite_policy_is_rejected() {
    let dir = TempDir::new().unwrap();
    let scope = write_scope(&dir, "scope.json", r#"{"a": 1}"#);

    Command::cargo_bin("varsnap")
        .unwrap()
        .args(["save", "out"])
        .arg("--scope")
        .arg(&scope)
        .args(["--overwrite", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("overwrite"));
}

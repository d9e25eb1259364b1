use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

fn livespell(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("livespell").unwrap();
    cmd.current_dir(dir.path())
        .arg("--personal-dict")
        .arg(dir.path().join("personal.txt"))
        .arg("--no-color")
        .arg("-l")
        .arg("en_US");
    cmd
}

#[test]
fn clean_file_passes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("clean.txt"), "This is a test of the build.\n").unwrap();

    livespell(&dir)
        .arg("clean.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("No spelling errors found"));
}

#[test]
fn misspelling_fails_with_location() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "This is a test.\nThe confguration is good.\n").unwrap();

    livespell(&dir)
        .arg("notes.txt")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2:5 confguration [en_US]"))
        .stdout(predicate::str::contains("1 error found in 1 file"));
}

#[test]
fn no_fail_exits_zero() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "The confguration is good.\n").unwrap();

    livespell(&dir).arg("--no-fail").arg("notes.txt").assert().success();
}

#[test]
fn json_output() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "# Test\n\nThe confguration is good.\n\n```\nxyzzy\n```\n").unwrap();

    let output = livespell(&dir)
        .args(["-o", "json", "--no-fail", "notes.md"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files_checked"], 1);
    assert_eq!(value["total_errors"], 1);
    assert_eq!(value["errors"][0]["word"], "confguration");
    assert_eq!(value["errors"][0]["line"], 3);
}

#[test]
fn added_words_are_remembered() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "The confguration is good.\n").unwrap();

    livespell(&dir)
        .args(["--add-to-dict", "confguration"])
        .assert()
        .success();
    assert!(fs::read_to_string(dir.path().join("personal.txt"))
        .unwrap()
        .contains("confguration"));

    livespell(&dir).arg("notes.txt").assert().success();
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    livespell(&dir)
        .arg("absent.txt")
        .assert()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn no_files_is_an_error() {
    let dir = tempdir().unwrap();
    livespell(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files specified"));
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn pakt_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pakt").unwrap();
    cmd.env("PAKT_HOME", home.path());
    cmd
}

#[test]
fn test_cache_stats_and_clear() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("composer.json"), r#"{"name": "acme/app"}"#).unwrap();
    let files = tmp.path().join(".pakt/cache/files/psr");
    fs::create_dir_all(&files).unwrap();
    fs::write(files.join("log-3.0.0.zip"), vec![0u8; 2048]).unwrap();

    pakt_cmd(&home)
        .current_dir(tmp.path())
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Archives: 1"));

    pakt_cmd(&home)
        .current_dir(tmp.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared archive cache (2.0 KB freed)"));

    assert!(!tmp.path().join(".pakt/cache/files").exists());
}

#[test]
fn test_cache_dir_from_global_config() {
    let home = TempDir::new().unwrap();
    let shared = TempDir::new().unwrap();
    fs::write(
        home.path().join("config.toml"),
        format!("[cache]\ndir = {:?}\n", shared.path().display().to_string()),
    )
    .unwrap();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("composer.json"), r#"{"name": "acme/app"}"#).unwrap();

    pakt_cmd(&home)
        .current_dir(tmp.path())
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            shared.path().join("files").display().to_string(),
        ));
}

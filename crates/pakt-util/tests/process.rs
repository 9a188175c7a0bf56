use pakt_util::process::CommandBuilder;

#[test]
fn test_builder_simple_command() {
    let output = CommandBuilder::new("echo").arg("hello").exec().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "hello");
}

#[test]
fn test_builder_multiple_args() {
    let output = CommandBuilder::new("echo")
        .args(["one", "two", "three"])
        .exec()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "one two three");
}

#[cfg(unix)]
#[test]
fn test_builder_with_env() {
    let output = CommandBuilder::new("sh")
        .arg("-c")
        .arg("echo $PAKT_TEST_VAR")
        .env("PAKT_TEST_VAR", "pakt_test_value")
        .exec()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "pakt_test_value");
}

#[cfg(unix)]
#[test]
fn test_builder_with_cwd() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pakt_cwd_test.marker"), "ok").unwrap();
    let output = CommandBuilder::new("ls")
        .arg("pakt_cwd_test.marker")
        .cwd(tmp.path())
        .exec()
        .unwrap();
    assert!(output.status.success());
}

#[cfg(unix)]
#[test]
fn test_prepend_path_finds_local_binary() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::TempDir::new().unwrap();
    let bin = tmp.path().join("vendor").join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let tool = bin.join("pakt-fake-tool");
    std::fs::write(&tool, "#!/bin/sh\necho from-vendor-bin\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = CommandBuilder::new("sh")
        .args(["-c", "pakt-fake-tool"])
        .prepend_path(&bin)
        .exec()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "from-vendor-bin");
}

#[cfg(unix)]
#[test]
fn test_run_reports_exit_status() {
    let status = CommandBuilder::new("sh").args(["-c", "exit 3"]).run().unwrap();
    assert_eq!(status.code(), Some(3));
}

#[test]
fn test_builder_nonexistent_program() {
    let result = CommandBuilder::new("nonexistent_program_xyz_123").exec();
    assert!(result.is_err());
}

#[test]
fn test_display_joins_args() {
    let cmd = CommandBuilder::new("php").args(["-r", "echo 1;"]);
    assert_eq!(cmd.display(), "php -r echo 1;");
}

//! Error handling of the icat binary

use std::process::Command;

#[test]
fn test_missing_file_fails_with_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.png");

    let output = Command::new(env!("CARGO_BIN_EXE_icat"))
        .arg(&missing)
        .env_remove("TMUX")
        .output()
        .expect("Failed to run icat");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.starts_with("icat: failed displaying image: "),
        "unexpected stderr: {stderr}"
    );
    assert!(stderr.contains("missing.png"), "unexpected stderr: {stderr}");
}

#[test]
fn test_invalid_columns_are_rejected() {
    for bad in ["0", "abc", "1000"] {
        let output = Command::new(env!("CARGO_BIN_EXE_icat"))
            .args(["--columns", bad, "image.png"])
            .output()
            .expect("Failed to run icat");

        assert!(!output.status.success(), "--columns {bad} should fail");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("positive integer"), "unexpected stderr: {stderr}");
    }
}

#[test]
fn test_log_file_receives_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("icat.log");

    let output = Command::new(env!("CARGO_BIN_EXE_icat"))
        .args(["--log-level", "debug", "--log-file"])
        .arg(&log)
        .arg(dir.path().join("missing.png"))
        .output()
        .expect("Failed to run icat");

    assert!(!output.status.success());
    let logged = std::fs::read_to_string(&log).unwrap();
    assert!(logged.contains("Using IcatConfig"), "log was: {logged}");
    assert!(!logged.contains('\x1b'), "log file must not contain colour codes");
}

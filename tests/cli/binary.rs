//! Runs the `caplist` binary end to end

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_caplist(args: &[&str], stdin: &str) -> Output {
    let config = tempfile::NamedTempFile::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_caplist"))
        .args(["--config-file"])
        .arg(config.path())
        .args(["--no-color", "--log-format", "text"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_dry_run_pushes_every_valid_line() {
    let output = run_caplist(
        &["--dry-run", "--format", "events:{{user_id}}", "--size", "3"],
        "{\"user_id\":\"u1\"}\nnot json\n{\"user_id\":\"u2\"}\n",
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("pushing 0000000000000001 to events:u1"), "{}", stderr);
    assert!(stderr.contains("pushing 0000000000000003 to events:u2"), "{}", stderr);
    assert!(stderr.contains("parsing json"), "{}", stderr);
    assert!(stderr.contains("pushed=2"), "{}", stderr);
    assert!(stderr.contains("skipped=1"), "{}", stderr);
}

#[test]
fn test_invalid_format_exits_non_zero() {
    let output = run_caplist(&["--dry-run", "--format", "events:{{user_id"], "");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("FATAL"), "{}", stderr);
    assert!(stderr.contains("invalid key format"), "{}", stderr);
}

#[test]
fn test_missing_format_exits_non_zero() {
    let output = run_caplist(&["--dry-run"], "");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("no key format given"), "{}", stderr);
}

#[test]
fn test_version_mentions_build_metadata() {
    let output = Command::new(env!("CARGO_BIN_EXE_caplist"))
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::tempdir;

/// Feed a multi-line script to the shell through a pipe; the repl runs it
/// line by line exactly as it would interactive input.
fn run_msh_script(script: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_msh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn msh");
    child
        .stdin
        .as_mut()
        .expect("piped stdin")
        .write_all(script.as_bytes())
        .expect("write script");
    child.wait_with_output().expect("failed to wait for msh")
}

#[test]
fn background_job_is_listed_running() {
    let output = run_msh_script("sleep 2 &\njobs\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]"), "missing job id: {stdout}");
    assert!(stdout.contains("running"), "missing state: {stdout}");
    assert!(stdout.contains("sleep 2"), "missing command: {stdout}");
}

#[test]
fn finished_background_job_is_reported_once_and_removed() {
    let output = run_msh_script("sleep 0.1 &\nsleep 0.3\njobs\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("done"), "no completion report: {stdout}");
    assert!(stdout.contains("sleep 0.1"), "missing command: {stdout}");
    assert_eq!(
        stdout.matches("done").count(),
        1,
        "completion reported more than once: {stdout}"
    );
}

#[test]
fn fg_with_no_jobs_reports_an_error_and_continues() {
    let output = run_msh_script("fg\necho still-here\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fg:"), "missing error prefix: {stderr}");
    assert!(stderr.contains("not found"), "wrong error class: {stderr}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("still-here"), "shell stopped: {stdout}");
}

#[test]
fn fg_waits_for_the_job_and_removes_it_from_the_table() {
    let output = run_msh_script("sleep 0.2 &\nfg 1\njobs\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    // fg echoes the command line it resumes
    assert!(stdout.contains("sleep 0.2"), "fg did not echo: {stdout}");
    // after fg returns the table is empty
    assert!(
        !stdout.contains("running"),
        "job still tracked after fg: {stdout}"
    );
}

#[test]
fn fg_with_bad_job_ids() {
    let output = run_msh_script("fg nope\nfg 42\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid argument"),
        "malformed id not rejected: {stderr}"
    );
    assert!(stderr.contains("not found"), "unknown id accepted: {stderr}");
}

#[test]
fn cd_to_missing_directory_keeps_cwd_and_continues() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_msh"))
        .current_dir("/")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn msh");
    child
        .stdin
        .as_mut()
        .expect("piped stdin")
        .write_all(b"cd /nonexistent-msh-dir\npwd\nexit\n")
        .expect("write script");
    let output = child.wait_with_output().expect("failed to wait for msh");

    assert!(output.status.success(), "shell died: {:?}", output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cd:"), "cd error missing: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "/\n");
}

#[test]
fn umask_prints_default_and_updates() {
    let output = run_msh_script("umask\numask 077\numask\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0022\n0077\n");
}

#[test]
fn umask_rejects_invalid_masks_and_keeps_the_old_value() {
    let output = run_msh_script("umask 999\numask abc\numask\nexit\n");
    assert!(output.status.success(), "shell failed: {:?}", output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("umask:"), "no umask error: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0022\n");
}

#[test]
fn umask_applies_to_redirect_targets() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("masked.txt");
    let script = format!("umask 022\necho hi > {}\nexit\n", path.display());

    let output = run_msh_script(&script);
    assert!(output.status.success(), "shell failed: {:?}", output);

    let metadata = std::fs::metadata(&path).expect("redirect target");
    assert_eq!(metadata.permissions().mode() & 0o777, 0o666 & !0o022);
}

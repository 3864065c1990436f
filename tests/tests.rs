use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const OSSIM_BIN: &str = env!("CARGO_BIN_EXE_ossim");

/// A session script written into a temporary directory.
struct ScriptContext {
    _dir: TempDir,
    path: PathBuf,
}

impl ScriptContext {
    fn new(lines: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create script dir");
        let path = dir.path().join("session.txt");
        fs::write(&path, lines.join("\n")).expect("failed to write script");
        Self { _dir: dir, path }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(OSSIM_BIN)
            .args(args)
            .arg(&self.path)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run ossim")
    }
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(OSSIM_BIN)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run ossim");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .expect("failed to write to stdin");
    child.wait_with_output().expect("failed to wait for ossim")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "ossim failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout must be UTF-8")
}

#[test]
fn test_script() {
    let ctx = ScriptContext::new(&[
        "A 5 200",
        "A 3 100",
        "Sm",
        "t",
        "d 0 report.txt",
        "Si",
        "Sr",
    ]);
    let out = stdout(&ctx.run(&["1000", "2"]));

    assert!(out.contains("Spawned new process with PID: 1 RAM: 200 Priority: 5\n"));
    assert!(out.contains("Process 1 is now running\n"));
    assert!(out.contains(
        "0  |  1  |  0 - 199\n\
         1  |  2  |  200 - 299\n\
         2  |  0  |  300 - 999\n"
    ));
    assert!(out.contains("Terminated process 1\nProcess 2 is now running\n"));
    assert!(out.contains(
        "0      |> 2    |  report.txt\n\
         1      |  -    |  (idle)\n"
    ));
    assert!(out.ends_with("  PID  |  PRIORITY\n-------|------------\n"));
}

#[test]
fn test_prompts_for_sizes() {
    let out = stdout(&run_with_stdin(&[], "1000\n2\nA 1 2000\nSm\nexit\n"));

    assert!(out.starts_with("RAM Size (in bytes): Number of disks: "));
    assert!(out.contains("error: not enough contiguous memory for 2000 bytes\n"));
    assert!(out.contains("0  |  0  |  0 - 999\n"));
    // Piped input gets no command prompt
    assert!(!out.contains("> "));
}

#[test]
fn test_reprompts_invalid_size() {
    let output = run_with_stdin(&[], "lots\n64\n0\n");
    let out = stdout(&output);
    assert_eq!(out.matches("RAM Size (in bytes): ").count(), 2);
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("RAM size must be a positive integer, got 'lots'"));
}

#[test]
fn test_reprompts_huge_disk_count() {
    let output = run_with_stdin(&[], "1000\n18446744073709551615\n2\nSi\n");
    let out = stdout(&output);
    assert_eq!(out.matches("Number of disks: ").count(), 2);
    assert!(out.contains("1      |  -    |  (idle)\n"));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("disk count must be an integer from 0 to 1024"));
}

#[test]
fn test_malformed_commands() {
    let out = stdout(&run_with_stdin(
        &["100", "1"],
        "A five 10\nd\nD -1\nfrobnicate\nA 1 10\nA 1 10\nSr\n",
    ));

    assert!(out.contains("error: invalid priority\n"));
    assert!(out.contains("error: invalid disk id\n"));
    assert!(out.contains(
        "Unknown command: frobnicate\nPlease run help to see all available commands\n"
    ));
    assert!(out.ends_with("> 1    |  1\n  2    |  1\n"));
}

#[test]
fn test_priority_policy() {
    let ctx = ScriptContext::new(&["A 1 10", "A 1 10", "A 9 10", "Sr"]);
    let out = stdout(&ctx.run(&["--policy", "priority", "100", "0"]));
    assert!(out.ends_with("> 1    |  1\n  3    |  9\n  2    |  1\n"));
}

#[test]
fn test_invalid_arguments() {
    let output = run_with_stdin(&["0", "2"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("RAM size must be a positive integer"));

    let output = run_with_stdin(&["1000", "18446744073709551615"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("disk count must be an integer from 0 to 1024, got '18446744073709551615'"));

    let output = run_with_stdin(&["--policy", "lottery"], "");
    assert!(!output.status.success());

    let output = run_with_stdin(&["100", "1", "/nonexistent/session.txt"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to open script"));
}

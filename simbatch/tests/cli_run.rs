//! CLI tests: spawn the simbatch binary and check exit codes and side effects.

use std::process::Command;

use simbatch::core::types::Variant;
use simbatch::exit_codes;
use simbatch::test_support::TestLayout;

fn simbatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_simbatch"));
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn missing_input_dir_exits_invalid_without_writes() {
    let t = TestLayout::bare().expect("layout");

    let output = simbatch()
        .current_dir(t.base())
        .output()
        .expect("simbatch");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input directory"), "stderr: {stderr}");
    assert!(!t.base().join("outputfiles").exists());
}

#[test]
fn missing_binaries_dir_exits_invalid_without_writes() {
    let t = TestLayout::bare().expect("layout");
    t.write_file("inputfiles/a.txt", "").expect("input");

    let output = simbatch()
        .current_dir(t.base())
        .output()
        .expect("simbatch");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("binaries directory"), "stderr: {stderr}");
    assert!(!t.base().join("outputfiles").exists());
    assert!(!t.base().join("srcs").exists());
}

#[test]
fn missing_executable_exits_invalid() {
    let t = TestLayout::new().expect("layout");
    t.write_input("a.txt", "").expect("input");
    t.remove_executable(Variant::Forward).expect("remove");

    let output = simbatch()
        .arg("run")
        .arg("--base-dir")
        .arg(t.base())
        .output()
        .expect("simbatch");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("forward executable not found"),
        "stderr: {stderr}"
    );
}

#[cfg(unix)]
#[test]
fn run_exits_ok_even_when_outputs_are_missing() {
    let t = TestLayout::new().expect("layout");
    t.write_input("a.txt", "").expect("input");
    let report_path = t.root().join("report.json");

    let output = simbatch()
        .arg("run")
        .arg("--base-dir")
        .arg(t.base())
        .args(["--settle-delay-ms", "0"])
        .arg("--report")
        .arg(&report_path)
        .output()
        .expect("simbatch");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("summary: files=1 located=0 missing=2"),
        "stdout: {stdout}"
    );
    assert!(t.base().join("outputfiles").is_dir());
    let report = std::fs::read_to_string(&report_path).expect("report");
    assert!(report.contains("not_found"));
}

#[cfg(unix)]
#[test]
fn unwritable_report_keeps_ok_exit_and_summary() {
    let t = TestLayout::new().expect("layout");
    t.write_input("a.txt", "").expect("input");
    // A regular file where the report's parent directory should be.
    let blocker = t.write_file("blocker", "").expect("blocker");

    let output = simbatch()
        .arg("run")
        .arg("--base-dir")
        .arg(t.base())
        .args(["--settle-delay-ms", "0"])
        .arg("--report")
        .arg(blocker.join("report.json"))
        .output()
        .expect("simbatch");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("summary: files=1 located=0 missing=2"),
        "stdout: {stdout}"
    );
}

#[test]
fn init_writes_config_once() {
    let t = TestLayout::bare().expect("layout");

    let first = simbatch()
        .arg("init")
        .current_dir(t.base())
        .status()
        .expect("init");
    assert_eq!(first.code(), Some(exit_codes::OK));
    let config = std::fs::read_to_string(t.base().join("simbatch.toml")).expect("config");
    assert!(config.contains("param = \"50\""));

    let second = simbatch()
        .arg("init")
        .current_dir(t.base())
        .status()
        .expect("init again");
    assert_eq!(second.code(), Some(exit_codes::INVALID));

    let forced = simbatch()
        .args(["init", "--force"])
        .current_dir(t.base())
        .status()
        .expect("init force");
    assert_eq!(forced.code(), Some(exit_codes::OK));
}

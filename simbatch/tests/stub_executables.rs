//! End-to-end runs against real shell-script stand-ins for the simulators.
#![cfg(unix)]

use std::fs;

use simbatch::core::report::InvocationOutcome;
use simbatch::core::types::Variant;
use simbatch::io::invoker::ProcessInvoker;
use simbatch::test_support::TestLayout;

const FORWARD_TO_OUTPUT_DIR: &str = r#"#!/bin/sh
stem=$(basename "$1" .txt)
printf 'cycle,param\n1,%s\n' "$2" > "$OUTPUT_DIR/${stem}_forward_out.csv"
"#;

const NOFORWARD_TO_LOCAL_DIR: &str = r#"#!/bin/sh
stem=$(basename "$1" .txt)
mkdir -p outputfiles
printf 'cycle,param\n2,%s\n' "$2" > "outputfiles/${stem}_no_forward_out.csv"
"#;

const SILENT_FAILURE: &str = r#"#!/bin/sh
echo "reading $1"
echo "segfault" >&2
exit 139
"#;

#[test]
fn outputs_from_both_locations_end_up_in_output_dir() {
    let t = TestLayout::new().expect("layout");
    t.write_input("sample.txt", "addi x1, x0, 1\n").expect("input");
    t.install_executable(Variant::Forward, FORWARD_TO_OUTPUT_DIR)
        .expect("forward");
    t.install_executable(Variant::NoForward, NOFORWARD_TO_LOCAL_DIR)
        .expect("noforward");

    let runner = t.runner(ProcessInvoker).expect("runner");
    let report = runner.run().expect("run");

    let out = &runner.layout().output_dir;
    assert_eq!(
        fs::read_to_string(out.join("sample_forward_out.csv")).expect("forward csv"),
        "cycle,param\n1,50\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("sample_no_forward_out.csv")).expect("noforward csv"),
        "cycle,param\n2,50\n"
    );
    let invocations = &report.files[0].invocations;
    assert!(matches!(
        invocations[0].outcome,
        InvocationOutcome::InPlace { .. }
    ));
    assert!(matches!(
        invocations[1].outcome,
        InvocationOutcome::Copied { .. }
    ));
    assert!(
        t.base()
            .join("outputfiles/sample_no_forward_out.csv")
            .is_file(),
        "source stays in place"
    );
}

#[test]
fn captured_output_is_kept_when_nothing_is_found() {
    let t = TestLayout::new().expect("layout");
    t.write_input("bad.txt", "").expect("input");
    t.install_executable(Variant::Forward, SILENT_FAILURE)
        .expect("forward");
    t.install_executable(Variant::NoForward, SILENT_FAILURE)
        .expect("noforward");

    let runner = t.runner(ProcessInvoker).expect("runner");
    let report = runner.run().expect("run");

    assert_eq!(report.missing_count(), 2);
    let forward = &report.files[0].invocations[0];
    assert_eq!(forward.exit_code, Some(139));
    let InvocationOutcome::NotFound { stdout, stderr } = &forward.outcome else {
        panic!("expected NotFound, got {:?}", forward.outcome);
    };
    assert!(stdout.contains("reading"));
    assert!(stdout.contains("bad.txt"));
    assert_eq!(stderr, "segfault\n");
    assert!(t.output_names().expect("names").is_empty());
}

//! Batch orchestration: preflight, then forward + noforward for every input.
//!
//! Each input is handled strictly in sequence. Per-invocation failures (spawn
//! errors, missing outputs, copy errors) are logged and recorded in the
//! [`BatchReport`]; only preflight failures abort the run.

use std::thread;

use anyhow::Result;
use tracing::{info, warn};

use crate::core::report::{BatchReport, FileReport, InvocationOutcome, InvocationReport};
use crate::core::types::{InputFile, Variant};
use crate::io::cleanup::remove_stale_outputs;
use crate::io::config::BatchConfig;
use crate::io::discover::discover_inputs;
use crate::io::invoker::{InvocationRequest, Invoker};
use crate::io::layout::Layout;
use crate::io::preflight::{Executables, check_layout, ensure_output_dir};
use crate::io::process::CommandOutput;
use crate::io::relocate::{Located, find_output, relocate};

pub struct BatchRunner<I> {
    layout: Layout,
    config: BatchConfig,
    invoker: I,
}

impl<I: Invoker> BatchRunner<I> {
    pub fn new(layout: Layout, config: BatchConfig, invoker: I) -> Self {
        Self {
            layout,
            config,
            invoker,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Check directories and executables, then create the output dir.
    ///
    /// Nothing is written unless every check passes.
    pub fn preflight(&self) -> Result<Executables> {
        let executables = check_layout(&self.layout)?;
        ensure_output_dir(&self.layout)?;
        Ok(executables)
    }

    /// Run the whole batch.
    ///
    /// Returns `Err` only for preflight or input-listing failures.
    pub fn run(&self) -> Result<BatchReport> {
        let executables = self.preflight()?;
        let inputs = discover_inputs(&self.layout.input_dir)?;
        info!(
            count = inputs.len(),
            input_dir = %self.layout.input_dir.display(),
            "discovered inputs"
        );

        let mut report = BatchReport::default();
        for input in &inputs {
            report.files.push(self.process_file(&executables, input));
        }
        Ok(report)
    }

    fn process_file(&self, executables: &Executables, input: &InputFile) -> FileReport {
        let cleanup = remove_stale_outputs(&self.layout.output_dir, &input.stem);
        if !cleanup.removed.is_empty() {
            info!(file = %input.file_name, count = cleanup.removed.len(), "removed stale outputs");
        }
        // Outputs found below may be leftovers when this is set.
        let cleanup_error = cleanup.error.map(|err| {
            let error = format!("{err:#}");
            warn!(file = %input.file_name, err = %error, "stale output cleanup failed");
            error
        });

        let invocations = Variant::ALL
            .iter()
            .map(|&variant| self.process_variant(executables, input, variant))
            .collect();

        FileReport {
            input: input.path.clone(),
            stem: input.stem.clone(),
            removed_stale: cleanup.removed,
            cleanup_error,
            invocations,
        }
    }

    fn process_variant(
        &self,
        executables: &Executables,
        input: &InputFile,
        variant: Variant,
    ) -> InvocationReport {
        info!(file = %input.file_name, %variant, "processing");
        let request = InvocationRequest {
            executable: executables.path(variant).to_path_buf(),
            input: input.path.clone(),
            param: self.config.param.clone(),
            workdir: self.layout.base_dir.clone(),
            output_dir: self.layout.output_dir.clone(),
            timeout: self.config.invocation_timeout(),
            output_limit_bytes: self.config.output_limit_bytes,
        };

        let output = match self.invoker.invoke(&request) {
            Ok(output) => output,
            Err(err) => {
                let error = format!("{err:#}");
                warn!(file = %input.file_name, %variant, err = %error, "invocation failed");
                return InvocationReport {
                    variant,
                    exit_code: None,
                    timed_out: false,
                    outcome: InvocationOutcome::SpawnFailed { error },
                };
            }
        };

        // A failed run does not invalidate an output found below, even a stale one.
        if !output.success() {
            warn!(
                file = %input.file_name,
                %variant,
                exit_code = ?output.exit_code,
                timed_out = output.timed_out,
                "executable did not exit cleanly"
            );
        }

        self.settle();

        InvocationReport {
            variant,
            exit_code: output.exit_code,
            timed_out: output.timed_out,
            outcome: self.locate(input, variant, &output),
        }
    }

    fn locate(
        &self,
        input: &InputFile,
        variant: Variant,
        output: &CommandOutput,
    ) -> InvocationOutcome {
        let roots = self.layout.search_roots();
        let file_name = variant.output_file_name(&input.stem);

        let Some(found) = find_output(&roots, &file_name) else {
            let stdout = output.stdout_lossy();
            let stderr = output.stderr_lossy();
            warn!(
                file = %input.file_name,
                %variant,
                stdout = %stdout,
                stderr = %stderr,
                "could not find output file"
            );
            return InvocationOutcome::NotFound { stdout, stderr };
        };

        match relocate(&roots, &file_name, &found) {
            Ok(Located::InPlace(path)) => {
                info!(file = %input.file_name, %variant, output = %path.display(), "processed");
                InvocationOutcome::InPlace { path }
            }
            Ok(Located::Copied { from, to }) => {
                info!(
                    file = %input.file_name,
                    %variant,
                    from = %from.display(),
                    to = %to.display(),
                    "found output elsewhere, copied"
                );
                InvocationOutcome::Copied { from, to }
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(file = %input.file_name, %variant, err = %error, "copying output failed");
                InvocationOutcome::RelocateFailed { from: found, error }
            }
        }
    }

    /// Fixed pause so late filesystem writes by the child become visible.
    fn settle(&self) {
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedInvoker, TestLayout, stem_of, variant_of};
    use std::fs;

    #[test]
    fn forward_runs_before_noforward_for_each_file() {
        let t = TestLayout::new().expect("layout");
        t.write_input("b.txt", "").expect("input");
        t.write_input("a.txt", "").expect("input");
        let invoker = ScriptedInvoker::new(|_| Ok(CommandOutput::default()));

        let report = t.runner(&invoker).expect("runner").run().expect("run");

        let order: Vec<(String, Variant)> = invoker
            .calls()
            .iter()
            .map(|req| (stem_of(req), variant_of(req)))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), Variant::Forward),
                ("a".to_string(), Variant::NoForward),
                ("b".to_string(), Variant::Forward),
                ("b".to_string(), Variant::NoForward),
            ]
        );
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.missing_count(), 4);
    }

    #[test]
    fn request_carries_param_workdir_and_output_dir() {
        let t = TestLayout::new().expect("layout");
        let input = t.write_input("x.txt", "").expect("input");
        let invoker = ScriptedInvoker::new(|_| Ok(CommandOutput::default()));
        let runner = t.runner(&invoker).expect("runner");

        runner.run().expect("run");

        let calls = invoker.calls();
        let layout = runner.layout();
        assert_eq!(calls[0].param, "50");
        assert_eq!(calls[0].input, input);
        assert_eq!(calls[0].workdir, layout.base_dir);
        assert_eq!(calls[0].output_dir, layout.output_dir);
        assert!(calls[0].executable.ends_with("srcs/forward"));
        assert!(calls[1].executable.ends_with("srcs/noforward"));
    }

    #[test]
    fn relocate_failure_is_recorded_and_batch_continues() {
        let t = TestLayout::new().expect("layout");
        t.write_input("a.txt", "").expect("input");
        let layout = t.layout().expect("layout");
        let invoker = ScriptedInvoker::new(|_| Ok(CommandOutput::default()));
        let runner = t.runner(&invoker).expect("runner");
        runner.preflight().expect("preflight");

        // A directory at the canonical path makes the copy fail.
        let fallback = layout.base_dir.join("outputfiles");
        fs::create_dir_all(&fallback).expect("mkdir");
        fs::write(fallback.join("a_forward_out.csv"), "x").expect("write");
        fs::create_dir_all(layout.output_dir.join("a_forward_out.csv")).expect("mkdir");

        let report = runner.run().expect("run");
        let forward = &report.files[0].invocations[0];
        assert!(matches!(
            forward.outcome,
            InvocationOutcome::RelocateFailed { .. }
        ));
        assert_eq!(report.files[0].invocations.len(), 2);
    }
}

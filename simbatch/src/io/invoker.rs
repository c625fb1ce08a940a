//! Invoker abstraction for running the analysis executables.
//!
//! The [`Invoker`] trait decouples batch orchestration from process spawning.
//! Tests use scripted invokers that write (or withhold) output files without
//! spawning anything.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::io::process::{CommandOutput, run_command};

/// Environment variable telling the executables where to write their CSV.
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";

/// Parameters for one executable invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub executable: PathBuf,
    /// Absolute path of the input file, first positional argument.
    pub input: PathBuf,
    /// Second positional argument.
    pub param: String,
    /// Working directory of the child.
    pub workdir: PathBuf,
    /// Exported to the child as `OUTPUT_DIR`.
    pub output_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

pub trait Invoker {
    /// Run the executable to completion. A non-zero exit is not an error;
    /// only failing to spawn or wait on the child is.
    fn invoke(&self, request: &InvocationRequest) -> Result<CommandOutput>;
}

impl<T: Invoker + ?Sized> Invoker for &T {
    fn invoke(&self, request: &InvocationRequest) -> Result<CommandOutput> {
        (**self).invoke(request)
    }
}

/// Spawns the executable as a real child process.
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<CommandOutput> {
        let cmd = build_command(request);
        debug!(
            executable = %request.executable.display(),
            input = %request.input.display(),
            "invoking executable"
        );
        run_command(cmd, request.timeout, request.output_limit_bytes)
            .with_context(|| format!("run {}", request.executable.display()))
    }
}

/// `<executable> <input> <param>` with `OUTPUT_DIR` set on top of the inherited environment.
pub fn build_command(request: &InvocationRequest) -> Command {
    let mut cmd = Command::new(&request.executable);
    cmd.arg(&request.input)
        .arg(&request.param)
        .env(OUTPUT_DIR_ENV, &request.output_dir)
        .current_dir(&request.workdir);
    cmd
}

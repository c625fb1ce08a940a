//! Batch driver for the `forward` / `noforward` pipeline simulators.
//!
//! Runs both executables against every `.txt` in `inputfiles/`, then gathers
//! each run's CSV into `outputfiles/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use simbatch::batch::BatchRunner;
use simbatch::exit_codes;
use simbatch::io::config::{BatchConfig, CONFIG_FILE_NAME, load_config, write_config};
use simbatch::io::invoker::ProcessInvoker;
use simbatch::io::layout::Layout;
use simbatch::io::report::write_report;
use simbatch::logging;

#[derive(Parser)]
#[command(
    name = "simbatch",
    version,
    about = "Run the forward/noforward simulators over a directory of inputs"
)]
struct Cli {
    /// Defaults to `run` with no overrides.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process every `.txt` input with both executables.
    Run(RunArgs),
    /// Write a default `simbatch.toml` into the base directory.
    Init {
        /// Directory the layout is relative to (default: current directory).
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Directory the layout is relative to (default: current directory).
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Config file (default: `<base-dir>/simbatch.toml`, optional).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of `.txt` inputs. Relative paths resolve against the
    /// current directory, not the base dir.
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Directory holding `forward` and `noforward`. Relative paths resolve
    /// against the current directory, not the base dir.
    #[arg(long)]
    binaries_dir: Option<PathBuf>,
    /// Destination for the collected CSVs. Relative paths resolve against
    /// the current directory, not the base dir.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Pause after each invocation before searching for its output.
    #[arg(long)]
    settle_delay_ms: Option<u64>,
    /// Write a JSON report of every invocation to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        None => cmd_run(RunArgs::default()),
        Some(Command::Run(args)) => cmd_run(args),
        Some(Command::Init { base_dir, force }) => cmd_init(base_dir, force),
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let base_dir = resolve_base_dir(args.base_dir.as_deref())?;
    let config_path = match &args.config {
        Some(path) => absolute(path)?,
        None => base_dir.join(CONFIG_FILE_NAME),
    };
    if args.config.is_some() && !config_path.exists() {
        bail!("config file {} does not exist", config_path.display());
    }
    let config = apply_overrides(load_config(&config_path)?, &args)?;

    let layout = Layout::resolve(&base_dir, &config)?;
    info!(
        base_dir = %layout.base_dir.display(),
        output_dir = %layout.output_dir.display(),
        "starting batch"
    );
    let runner = BatchRunner::new(layout, config, ProcessInvoker);
    let report = runner.run()?;

    println!(
        "summary: files={} located={} missing={}",
        report.files.len(),
        report.located_count(),
        report.missing_count()
    );
    // Every input was attempted; a report that cannot be written does not change the exit code.
    if let Some(path) = &args.report
        && let Err(err) = absolute(path).and_then(|path| write_report(&path, &report))
    {
        let error = format!("{err:#}");
        warn!(err = %error, "writing report failed");
    }
    Ok(())
}

fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let base_dir = resolve_base_dir(base_dir.as_deref())?;
    let path = base_dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&path, &BatchConfig::default())?;
    println!("init: wrote {}", path.display());
    Ok(())
}

/// CLI paths are relative to the current directory, not the base dir.
fn apply_overrides(mut config: BatchConfig, args: &RunArgs) -> Result<BatchConfig> {
    if let Some(dir) = &args.input_dir {
        config.input_dir = absolute(dir)?;
    }
    if let Some(dir) = &args.binaries_dir {
        config.binaries_dir = absolute(dir)?;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = absolute(dir)?;
    }
    if let Some(delay) = args.settle_delay_ms {
        config.settle_delay_ms = delay;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_base_dir(base_dir: Option<&Path>) -> Result<PathBuf> {
    match base_dir {
        Some(dir) => absolute(dir),
        None => std::env::current_dir().context("read current directory"),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve {}", path.display()))
}

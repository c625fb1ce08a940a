//! Batch configuration stored in `simbatch.toml` next to the inputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "simbatch.toml";

/// Batch configuration (TOML).
///
/// Every field is optional in the file; missing fields default to the
/// `inputfiles/` + `srcs/` + `outputfiles/` layout with parameter `50`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory scanned for `.txt` inputs. Relative to the base dir.
    pub input_dir: PathBuf,

    /// Directory holding the `forward` and `noforward` executables.
    pub binaries_dir: PathBuf,

    /// Destination for relocated CSV outputs; created if missing.
    pub output_dir: PathBuf,

    /// Second argument passed to both executables.
    pub param: String,

    /// Pause after each invocation before searching for its output.
    pub settle_delay_ms: u64,

    /// Captured stdout/stderr beyond this many bytes is dropped.
    pub output_limit_bytes: usize,

    /// Kill an executable that runs longer than this. Unset waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_timeout_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("inputfiles"),
            binaries_dir: PathBuf::from("srcs"),
            output_dir: PathBuf::from("outputfiles"),
            param: "50".to_string(),
            settle_delay_ms: 1000,
            output_limit_bytes: 1_000_000,
            invocation_timeout_secs: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("input_dir", &self.input_dir),
            ("binaries_dir", &self.binaries_dir),
            ("output_dir", &self.output_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
        }
        if self.param.trim().is_empty() {
            return Err(anyhow!("param must not be empty"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.invocation_timeout_secs == Some(0) {
            return Err(anyhow!("invocation_timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<BatchConfig> {
    if !path.exists() {
        let cfg = BatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BatchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

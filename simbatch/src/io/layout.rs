//! Resolved directory layout for one batch run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::candidates::SearchRoots;
use crate::io::config::BatchConfig;

/// Absolute paths resolved once at startup and shared by every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Working directory for the executables and root of the fallback search.
    pub base_dir: PathBuf,
    pub input_dir: PathBuf,
    pub binaries_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Layout {
    /// Resolve config directories against `base_dir`. Absolute config entries
    /// are used as-is.
    pub fn resolve(base_dir: &Path, cfg: &BatchConfig) -> Result<Self> {
        let base_dir = std::path::absolute(base_dir)
            .with_context(|| format!("resolve base dir {}", base_dir.display()))?;
        Ok(Self {
            input_dir: base_dir.join(&cfg.input_dir),
            binaries_dir: base_dir.join(&cfg.binaries_dir),
            output_dir: base_dir.join(&cfg.output_dir),
            base_dir,
        })
    }

    pub fn search_roots(&self) -> SearchRoots {
        SearchRoots {
            output_dir: self.output_dir.clone(),
            base_dir: self.base_dir.clone(),
        }
    }
}

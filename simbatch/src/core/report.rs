//! Per-run outcome records, serialized by `simbatch run --report`.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::types::Variant;

/// What happened to one executable's output for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// Output was already at its canonical location.
    InPlace { path: PathBuf },
    /// Output was found elsewhere and copied to its canonical location.
    Copied { from: PathBuf, to: PathBuf },
    /// No candidate existed; carries the captured child output.
    NotFound { stdout: String, stderr: String },
    /// The executable could not be spawned or waited on.
    SpawnFailed { error: String },
    /// Output was found but could not be copied into place.
    RelocateFailed { from: PathBuf, error: String },
}

impl InvocationOutcome {
    pub fn is_located(&self) -> bool {
        matches!(self, Self::InPlace { .. } | Self::Copied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    pub variant: Variant,
    /// `None` when the child was killed by a signal or never ran.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub outcome: InvocationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub stem: String,
    pub removed_stale: Vec<PathBuf>,
    /// Set when stale outputs could not all be removed before invoking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
    pub invocations: Vec<InvocationReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn located_count(&self) -> usize {
        self.invocations()
            .filter(|inv| inv.outcome.is_located())
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.invocations()
            .filter(|inv| !inv.outcome.is_located())
            .count()
    }

    fn invocations(&self) -> impl Iterator<Item = &InvocationReport> {
        self.files.iter().flat_map(|file| file.invocations.iter())
    }
}

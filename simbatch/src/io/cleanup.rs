//! Removal of prior-run outputs before a stem is reprocessed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::stale::StalePattern;

/// Result of a cleanup pass. `removed` holds everything deleted before `error`
/// stopped the pass, so a partial cleanup is still visible.
#[derive(Debug, Default)]
pub struct StaleCleanup {
    pub removed: Vec<PathBuf>,
    pub error: Option<anyhow::Error>,
}

/// Delete regular files in `output_dir` named `<stem>_*_out.csv`.
///
/// Removed paths are sorted. A missing `output_dir` removes nothing.
pub fn remove_stale_outputs(output_dir: &Path, stem: &str) -> StaleCleanup {
    remove_stale_outputs_with(output_dir, stem, |path| fs::remove_file(path))
}

/// Same as [`remove_stale_outputs`] with a caller-supplied remover.
pub fn remove_stale_outputs_with<F>(output_dir: &Path, stem: &str, mut remove: F) -> StaleCleanup
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut cleanup = StaleCleanup::default();
    if let Err(err) = remove_matching(output_dir, stem, &mut remove, &mut cleanup.removed) {
        cleanup.error = Some(err);
    }
    cleanup.removed.sort();
    cleanup
}

fn remove_matching<F>(
    output_dir: &Path,
    stem: &str,
    remove: &mut F,
    removed: &mut Vec<PathBuf>,
) -> Result<()>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    if !output_dir.is_dir() {
        return Ok(());
    }
    let pattern = StalePattern::for_stem(stem)?;
    // Collect first so removals do not race the directory iterator.
    let mut matches = Vec::new();
    for entry in
        fs::read_dir(output_dir).with_context(|| format!("read {}", output_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !pattern.matches(name) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            matches.push(path);
        }
    }
    matches.sort();
    for path in matches {
        remove(&path).with_context(|| format!("remove {}", path.display()))?;
        debug!(path = %path.display(), "removed stale output");
        removed.push(path);
    }
    Ok(())
}

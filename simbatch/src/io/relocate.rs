//! Locate an executable's output CSV and normalize it into the output dir.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::candidates::{SearchRoots, candidate_paths};

/// Where the output was found, and whether it had to be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    InPlace(PathBuf),
    Copied { from: PathBuf, to: PathBuf },
}

/// First existing candidate for `file_name`, in search order.
pub fn find_output(roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
    candidate_paths(roots, file_name)
        .into_iter()
        .find(|path| path.is_file())
}

/// Copy `found` to the canonical path unless it already is that file.
///
/// The source is left in place. Permissions and modification time are preserved.
pub fn relocate(roots: &SearchRoots, file_name: &str, found: &Path) -> Result<Located> {
    let target = roots.canonical_path(file_name);
    if is_same_file(found, &target) {
        return Ok(Located::InPlace(target));
    }
    copy_preserving(found, &target)?;
    debug!(from = %found.display(), to = %target.display(), "copied output");
    Ok(Located::Copied {
        from: found.to_path_buf(),
        to: target,
    })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_preserving(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
    let modified = fs::metadata(from)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("read mtime {}", from.display()))?;
    File::options()
        .write(true)
        .open(to)
        .and_then(|file| file.set_modified(modified))
        .with_context(|| format!("set mtime {}", to.display()))?;
    Ok(())
}

//! Fatal precondition checks run before any input is touched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::types::Variant;
use crate::io::layout::Layout;

/// Executables verified by [`check_layout`], keyed by variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    pub forward: PathBuf,
    pub noforward: PathBuf,
}

impl Executables {
    pub fn path(&self, variant: Variant) -> &Path {
        match variant {
            Variant::Forward => &self.forward,
            Variant::NoForward => &self.noforward,
        }
    }
}

/// Verify the input dir, binaries dir, and both executables, in that order.
///
/// Performs no writes; the first failure is returned.
pub fn check_layout(layout: &Layout) -> Result<Executables> {
    if !layout.input_dir.is_dir() {
        bail!(
            "input directory {} does not exist",
            layout.input_dir.display()
        );
    }
    if !layout.binaries_dir.is_dir() {
        bail!(
            "binaries directory {} does not exist",
            layout.binaries_dir.display()
        );
    }
    let forward = check_executable(&layout.binaries_dir, Variant::Forward)?;
    let noforward = check_executable(&layout.binaries_dir, Variant::NoForward)?;
    Ok(Executables { forward, noforward })
}

/// Create the output directory (and parents). Existing is fine.
pub fn ensure_output_dir(layout: &Layout) -> Result<()> {
    fs::create_dir_all(&layout.output_dir)
        .with_context(|| format!("create output dir {}", layout.output_dir.display()))
}

fn check_executable(binaries_dir: &Path, variant: Variant) -> Result<PathBuf> {
    let path = binaries_dir.join(variant.executable_name());
    if !path.is_file() {
        bail!(
            "{} executable not found in {}",
            variant.executable_name(),
            binaries_dir.display()
        );
    }
    if !is_executable(&path)? {
        bail!("{} is not executable", path.display());
    }
    debug!(variant = %variant, path = %path.display(), "executable found");
    Ok(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    Ok(meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> Result<bool> {
    Ok(true)
}

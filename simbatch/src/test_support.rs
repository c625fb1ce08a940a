//! Test-only helpers: temp directory layouts and scripted invokers.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::batch::BatchRunner;
use crate::core::types::Variant;
use crate::io::config::BatchConfig;
use crate::io::invoker::{InvocationRequest, Invoker};
use crate::io::layout::Layout;
use crate::io::process::CommandOutput;

/// Output dir name used by [`TestLayout::config`], distinct from the
/// `outputfiles/` fallback so relocation is observable.
pub const TEST_OUTPUT_DIR: &str = "results";

/// A throwaway batch layout: `<tmp>/sim` is the base dir, so the parent
/// fallback (`<tmp>/outputfiles`) stays inside the temp dir.
pub struct TestLayout {
    temp: TempDir,
    base: PathBuf,
}

impl TestLayout {
    /// Base dir with `inputfiles/` and `srcs/{forward,noforward}`.
    pub fn new() -> Result<Self> {
        let layout = Self::bare()?;
        fs::create_dir_all(layout.base.join("inputfiles")).context("create inputfiles")?;
        for variant in Variant::ALL {
            layout.install_executable(variant, "#!/bin/sh\nexit 0\n")?;
        }
        Ok(layout)
    }

    /// Empty base dir.
    pub fn bare() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let base = temp.path().join("sim");
        fs::create_dir_all(&base).context("create base dir")?;
        Ok(Self { temp, base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Temp root, i.e. the base dir's parent.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Default config with no settle delay and output into [`TEST_OUTPUT_DIR`].
    pub fn config(&self) -> BatchConfig {
        BatchConfig {
            output_dir: PathBuf::from(TEST_OUTPUT_DIR),
            settle_delay_ms: 0,
            ..BatchConfig::default()
        }
    }

    pub fn layout(&self) -> Result<Layout> {
        Layout::resolve(&self.base, &self.config())
    }

    pub fn runner<I: Invoker>(&self, invoker: I) -> Result<BatchRunner<I>> {
        Ok(BatchRunner::new(self.layout()?, self.config(), invoker))
    }

    pub fn write_input(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.base.join("inputfiles").join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write `script` as `srcs/<executable>` and mark it executable.
    pub fn install_executable(&self, variant: Variant, script: &str) -> Result<PathBuf> {
        let dir = self.base.join("srcs");
        fs::create_dir_all(&dir).context("create srcs")?;
        let path = dir.join(variant.executable_name());
        fs::write(&path, script).with_context(|| format!("write {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("chmod {}", path.display()))?;
        }
        Ok(path)
    }

    pub fn remove_executable(&self, variant: Variant) -> Result<()> {
        let path = self.base.join("srcs").join(variant.executable_name());
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }

    /// Write a file relative to the base dir, creating parents.
    pub fn write_file(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        write_with_parents(&self.base.join(rel), contents)
    }

    /// Sorted file names in the output dir.
    pub fn output_names(&self) -> Result<Vec<String>> {
        let dir = self.layout()?.output_dir;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
            let entry = entry.context("read entry")?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

pub fn write_with_parents(path: &Path, contents: &str) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path has no parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Drop write permission on `dir`.
///
/// Returns `false` (and restores the permissions) when the current user can
/// still write there, e.g. when running as root; callers should skip then.
#[cfg(unix)]
pub fn make_read_only(dir: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o555))
        .with_context(|| format!("chmod {}", dir.display()))?;
    let check = dir.join(".write-check");
    if fs::write(&check, "").is_ok() {
        let _ = fs::remove_file(&check);
        restore_writable(dir)?;
        return Ok(false);
    }
    Ok(true)
}

#[cfg(unix)]
pub fn restore_writable(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod {}", dir.display()))
}

type ScriptFn = Box<dyn Fn(&InvocationRequest) -> Result<CommandOutput>>;

/// Invoker that records every request and delegates to a closure instead of
/// spawning a process.
pub struct ScriptedInvoker {
    calls: RefCell<Vec<InvocationRequest>>,
    script: ScriptFn,
}

impl ScriptedInvoker {
    pub fn new(script: impl Fn(&InvocationRequest) -> Result<CommandOutput> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            script: Box::new(script),
        }
    }

    pub fn calls(&self) -> Vec<InvocationRequest> {
        self.calls.borrow().clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(request.clone());
        (self.script)(request)
    }
}

/// Variant a request targets, derived from the executable's file name.
pub fn variant_of(request: &InvocationRequest) -> Variant {
    match request.executable.file_name().and_then(|n| n.to_str()) {
        Some("noforward") => Variant::NoForward,
        _ => Variant::Forward,
    }
}

/// Stem of the request's input file.
pub fn stem_of(request: &InvocationRequest) -> String {
    request
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Canonical output file name a request is expected to produce.
pub fn output_name_of(request: &InvocationRequest) -> String {
    variant_of(request).output_file_name(&stem_of(request))
}

/// Captured output with the given exit code and stderr text.
pub fn exited(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(code),
        stderr: stderr.as_bytes().to_vec(),
        ..CommandOutput::default()
    }
}

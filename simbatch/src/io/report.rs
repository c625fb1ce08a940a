//! JSON run report writer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::report::BatchReport;

/// Write `report` as pretty-printed JSON with a trailing newline.
pub fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    let mut payload = serde_json::to_string_pretty(report).context("serialize report")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

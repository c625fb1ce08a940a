//! Input discovery: regular `.txt` files directly inside the input dir.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::types::InputFile;

pub const INPUT_EXTENSION: &str = ".txt";

/// List `.txt` inputs sorted by file name. Subdirectories are not descended.
pub fn discover_inputs(input_dir: &Path) -> Result<Vec<InputFile>> {
    let mut inputs = Vec::new();
    for entry in
        fs::read_dir(input_dir).with_context(|| format!("read {}", input_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %path.display(), "skipping non-utf8 file name");
            continue;
        };
        if !file_name.ends_with(INPUT_EXTENSION) || !path.is_file() {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&file_name)
            .to_string();
        inputs.push(InputFile {
            path,
            file_name,
            stem,
        });
    }
    inputs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(inputs)
}

//! Ordered candidate locations for an executable's output CSV.
//!
//! The executables do not reliably honor `OUTPUT_DIR`, so their output is
//! searched in a fixed priority order and the first existing path wins.

use std::path::{Path, PathBuf};

/// Directory name the executables fall back to writing into.
pub const FALLBACK_DIR_NAME: &str = "outputfiles";

/// Roots that candidate builders derive paths from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    pub output_dir: PathBuf,
    pub base_dir: PathBuf,
}

impl SearchRoots {
    /// Where the relocated output for `file_name` must end up.
    pub fn canonical_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

type CandidateFn = fn(&SearchRoots, &str) -> Option<PathBuf>;

/// A named path builder. `None` means the location does not apply.
#[derive(Clone, Copy)]
pub struct Candidate {
    pub name: &'static str,
    build: CandidateFn,
}

impl Candidate {
    pub fn path(&self, roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
        (self.build)(roots, file_name)
    }
}

pub const CANDIDATES: &[Candidate] = &[
    Candidate {
        name: "output_dir",
        build: in_output_dir,
    },
    Candidate {
        name: "base_outputfiles",
        build: in_base_outputfiles,
    },
    Candidate {
        name: "parent_outputfiles",
        build: in_parent_outputfiles,
    },
];

fn in_output_dir(roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
    Some(roots.output_dir.join(file_name))
}

fn in_base_outputfiles(roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
    Some(fallback_path(&roots.base_dir, file_name))
}

fn in_parent_outputfiles(roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
    roots
        .base_dir
        .parent()
        .map(|parent| fallback_path(parent, file_name))
}

fn fallback_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(FALLBACK_DIR_NAME).join(file_name)
}

/// Candidate paths in search order, skipping builders that do not apply.
pub fn candidate_paths(roots: &SearchRoots, file_name: &str) -> Vec<PathBuf> {
    CANDIDATES
        .iter()
        .filter_map(|candidate| candidate.path(roots, file_name))
        .collect()
}

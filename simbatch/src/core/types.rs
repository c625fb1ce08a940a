//! Core domain types shared by discovery, invocation, and relocation.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Which of the two analysis executables an invocation targets.
///
/// Serialized and displayed as the executable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Forward,
    NoForward,
}

impl Variant {
    /// Invocation order for every input file.
    pub const ALL: [Variant; 2] = [Variant::Forward, Variant::NoForward];

    /// File name of the executable inside the binaries directory.
    pub fn executable_name(self) -> &'static str {
        match self {
            Variant::Forward => "forward",
            Variant::NoForward => "noforward",
        }
    }

    /// Infix used in the output CSV name. Note `no_forward`, not `noforward`.
    pub fn output_infix(self) -> &'static str {
        match self {
            Variant::Forward => "forward",
            Variant::NoForward => "no_forward",
        }
    }

    /// `<stem>_<infix>_out.csv`
    pub fn output_file_name(self, stem: &str) -> String {
        format!("{stem}_{}_out.csv", self.output_infix())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// A `.txt` input discovered in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Absolute path handed to the executables.
    pub path: PathBuf,
    pub file_name: String,
    /// Base name without the `.txt` extension.
    pub stem: String,
}

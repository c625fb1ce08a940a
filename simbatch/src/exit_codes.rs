//! Stable exit codes for the simbatch CLI.

/// Every input was attempted, regardless of how many outputs were located
/// or whether the `--report` file could be written.
pub const OK: i32 = 0;
/// Preflight failed (missing directory or executable) or the config was invalid.
pub const INVALID: i32 = 1;

//! Batch driver for the `forward` / `noforward` pipeline simulators.
//!
//! For every `.txt` input the driver runs both executables, finds the CSV each
//! one wrote (the executables do not agree on where), and consolidates the
//! results into a single output directory. The crate is split the same way as
//! the run itself:
//!
//! - **[`core`]**: Pure, deterministic logic (naming, candidate search order,
//!   stale-output matching, report types).
//! - **[`io`]**: Side-effecting operations (config, discovery, process
//!   execution, cleanup, relocation).
//!
//! [`batch`] coordinates the two to implement `simbatch run`.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

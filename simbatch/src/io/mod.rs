//! I/O helpers for the batch run.

pub mod cleanup;
pub mod config;
pub mod discover;
pub mod invoker;
pub mod layout;
pub mod preflight;
pub mod process;
pub mod relocate;
pub mod report;

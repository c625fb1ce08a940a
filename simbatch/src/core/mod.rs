//! Pure, deterministic batch logic. No I/O beyond path construction.

pub mod candidates;
pub mod report;
pub mod stale;
pub mod types;

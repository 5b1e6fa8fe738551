//! Records exchanged between a running station and its observers
//!
//! - `run_log`: per-step execution records written to the run log
//! - `metadata`: who/what/when of a protocol run

pub mod run_log;
pub mod metadata;

pub use run_log::StepRecord;
pub use metadata::RunMetadata;

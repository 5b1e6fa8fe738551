//! Shared types for the liquid-handling stations
//!
//! Contains the identifiers, protocol modes and run-log records that every
//! station binary agrees on. Station-internal types (reservoir state,
//! transfer options) live in the station crate.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{RunMetadata, StepRecord};

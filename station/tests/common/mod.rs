//! Common test utilities and infrastructure
//!
//! Shared fixtures and builders used by the station test suites.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{StationBuilder, TestHelpers};

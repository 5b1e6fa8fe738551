//! Service implementations
//!
//! Real implementations of the seam traits. These are what the `station`
//! binary wires together; tests swap them for mocks.

pub mod operator;
pub mod run_log;
pub mod settings;
pub mod simulated_actuator;

#[cfg(test)]
mod tests;

pub use operator::ConsoleOperator;
pub use run_log::{MemoryRunLog, TsvRunLog};
pub use settings::EnvSettingsSource;
pub use simulated_actuator::{ActuatorCommand, SimulatedActuator};

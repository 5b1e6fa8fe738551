//! Step records emitted once per protocol step

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution record for a single protocol step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_number: u32,
    pub executed: bool,
    pub description: String,
    /// Incubation time declared for the step, in seconds
    pub wait_time_seconds: u64,
    /// Wall time the step took; `None` when the step was skipped
    pub elapsed: Option<Duration>,
}

impl StepRecord {
    pub fn skipped(step_number: u32, description: impl Into<String>, wait_time_seconds: u64) -> Self {
        Self {
            step_number,
            executed: false,
            description: description.into(),
            wait_time_seconds,
            elapsed: None,
        }
    }

    pub fn completed(
        step_number: u32,
        description: impl Into<String>,
        wait_time_seconds: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            step_number,
            executed: true,
            description: description.into(),
            wait_time_seconds,
            elapsed: Some(elapsed),
        }
    }
}

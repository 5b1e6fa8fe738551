//! Station-specific error types

use shared::SharedError;
use shared::Microliters;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Reagent {reagent} exhausted: no well after index {well_index} of {well_count}")]
    ReservoirExhausted {
        reagent: String,
        well_index: usize,
        well_count: usize,
    },

    #[error("Tips exhausted for {pipette}: {capacity} tips used")]
    ConsumableExhausted { pipette: String, capacity: u32 },

    #[error("Transfer of {volume} ul does not fit pipette capacity of {capacity} ul")]
    TransferVolumeOverflow {
        volume: Microliters,
        capacity: Microliters,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Unknown protocol step: {step}")]
    UnknownStep { step: u32 },

    #[error("Shared component error")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StationError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        StationError::Configuration { reason: reason.into() }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        StationError::InvalidInput { reason: reason.into() }
    }

    /// Whether an operator can fix the condition and resume the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StationError::ConsumableExhausted { .. })
    }
}

pub type StationResult<T> = Result<T, StationError>;

//! Shared error types for the liquid-handling stations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid protocol mode: {input} (expected V or P)")]
    InvalidMode { input: String },

    #[error("Invalid UUID: {input}")]
    InvalidUuid { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;

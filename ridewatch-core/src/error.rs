//! Core error types for `RideWatch`.

use thiserror::Error;

/// Core error type for `RideWatch` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown examination type name or id.
    #[error("Unknown examination type: {0}")]
    UnknownExamType(String),

    /// Invalid data from a response or the database.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

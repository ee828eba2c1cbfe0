//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Pipeline wiring error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Settings update rejected
    #[error("{0}")]
    InvalidSettings(#[from] sentra_core::CoreError),

    /// Malformed transaction request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Simulation requested while simulation mode is off
    #[error("Simulation mode is disabled in settings")]
    SimulationDisabled,

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] sentra_runtime::RuntimeError),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

//! Runtime error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A store read or write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// An external HTTP collaborator failed or answered with an error
    #[error("External call failed: {0}")]
    ExternalCallFailed(String),

    /// An external call exceeded its deadline
    #[error("External call timed out after {0}ms")]
    Timeout(u64),

    /// The ML circuit is open; no call was attempted
    #[error("ML circuit breaker open until {0}")]
    CircuitOpen(DateTime<Utc>),

    /// A transaction with this id is already stored
    #[error("Duplicate transaction id: {0}")]
    DuplicateTransaction(String),

    /// Publishing to the event bus failed
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Configuration could not be read or violates an invariant
    #[error("Configuration error: {0}")]
    Config(#[from] sentra_core::CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

//! Core Error Types
//!
//! Defines the foundational error types used across the Gatekeeper workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The root crate extends these with configuration-file variants (TOML parsing,
//! file I/O) that require heavier dependencies.

use thiserror::Error;

/// Core error type for the Gatekeeper workspace.
///
/// Only `InvalidArgument` is ever surfaced by the orchestrator's public API as
/// an `Err`. `NotFound` backs registry lookups. Everything a gate produces is
/// converted into a structured result.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Programming errors at registration or configuration time
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Lookup of an unregistered gate
    #[error("Not found: {0}")]
    NotFound(String),

    /// A gate raised an error while executing
    #[error("Gate '{gate}' failed to execute: {message}")]
    GateExecution { gate: String, message: String },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a gate execution error
    pub fn gate_execution(gate: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::GateExecution {
            gate: gate.into(),
            message: msg.into(),
        }
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

//! Error types for the sweat_core library.

use crate::types::SessionStatus;
use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sweat_core operations
///
/// The first four variants are storage-layer failures; the engine surfaces
/// them to the caller without retrying. Everything else is a recoverable
/// business-rule error carrying the offending ids/values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input (empty name, out-of-bounds value, non-positive cost)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Operation attempted against an entity not in the required state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Another session already holds the single Active slot
    #[error("another session is already active: {id}")]
    ActiveSessionExists { id: Uuid },

    /// The pool has no visible workout to select from
    #[error("pool {id} has no visible workouts")]
    EmptyPool { id: Uuid },

    /// Balance too low for the requested redemption
    #[error("insufficient points: balance is {balance}, required {required}")]
    InsufficientPoints { balance: u32, required: u32 },

    /// Referential or business-rule failure surfaced by the validator
    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl Error {
    /// Shorthand for the state-machine rejection every mutating session
    /// operation shares.
    pub(crate) fn session_not_active(id: Uuid, status: SessionStatus) -> Self {
        Error::InvalidState(format!("session {} is {}, expected active", id, status))
    }
}

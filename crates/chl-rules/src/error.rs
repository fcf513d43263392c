//! Error types for the challenge rules engine.

use chl_core::SessionError;
use thiserror::Error;

/// Result type for registry and engine operations.
pub type RulesResult<T> = Result<T, RulesError>;

/// Errors returned by registry and engine operations. None of them leave a
/// partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// No challenge is registered under this id.
    #[error("challenge not found: \"{0}\"")]
    NotFound(String),

    /// A challenge with this id is already registered.
    #[error("challenge already registered: \"{0}\"")]
    DuplicateId(String),

    /// A setting value fell outside the entry's declared range.
    #[error("value {value} for \"{id}\" is outside {min}..={max}")]
    OutOfRange {
        /// The challenge id.
        id: String,
        /// The rejected value.
        value: i32,
        /// Lowest accepted value.
        min: i32,
        /// Highest accepted value.
        max: i32,
    },

    /// The challenge could not be activated and was left disabled.
    #[error("challenge could not be activated: \"{0}\"")]
    Unavailable(String),

    /// Session state machine error.
    #[error(transparent)]
    Session(#[from] SessionError),
}

//! Session error types.

use ratecalc_common::CodeError;
use thiserror::Error;

/// Errors returned by session operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Typed currency code was rejected.
    #[error("Invalid currency code: {0}")]
    InvalidCode(#[from] CodeError),

    /// Calculate was requested without a loaded rate table.
    #[error("Rates are not loaded")]
    RatesNotLoaded,

    /// Session configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

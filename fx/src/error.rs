//! FX error types.

use std::time::Duration;

use ratecalc_common::{CurrencyCode, RateTableError};
use thiserror::Error;

/// Errors that can occur while fetching a rate table.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("Provider returned status {status}")]
    Status { status: u16, body: Option<String> },

    /// Response body did not match the expected shape.
    #[error("Malformed rate payload: {0}")]
    MalformedPayload(String),

    /// Response was well formed but contained no rates.
    #[error("Provider returned no rates for base {0}")]
    EmptyRateTable(CurrencyCode),

    /// Request did not complete in time.
    #[error("Rate request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider-specific failure.
    #[error("Rate provider error: {0}")]
    ProviderError(String),

    /// Provider is misconfigured (bad URL, missing key).
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),
}

impl FxError {
    /// Whether re-issuing the same request might succeed.
    ///
    /// Nothing retries automatically; this only drives the retry hint shown
    /// to the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            FxError::Transport(_) | FxError::Timeout(_) => true,
            FxError::Status { status, .. } => *status == 429 || *status >= 500,
            FxError::MalformedPayload(_)
            | FxError::EmptyRateTable(_)
            | FxError::ProviderError(_)
            | FxError::Configuration(_) => false,
        }
    }

    /// Short machine-readable code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Transport(_) => "TRANSPORT",
            FxError::Status { .. } => "HTTP_STATUS",
            FxError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            FxError::EmptyRateTable(_) => "EMPTY_RATE_TABLE",
            FxError::Timeout(_) => "TIMEOUT",
            FxError::ProviderError(_) => "PROVIDER_ERROR",
            FxError::Configuration(_) => "CONFIGURATION",
        }
    }

    pub(crate) fn from_table_error(base: &CurrencyCode, err: RateTableError) -> Self {
        match err {
            RateTableError::Empty { .. } => FxError::EmptyRateTable(base.clone()),
            other => FxError::MalformedPayload(other.to_string()),
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

/// Why an amount could not be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAmount {
    /// Nothing was entered.
    Empty,
    /// Text is not a decimal number.
    Malformed,
    /// Number or product does not fit a decimal.
    OutOfRange,
}

/// Error returned by the conversion engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Amount text cannot be used. User-correctable.
    #[error("Invalid amount {input:?}")]
    InvalidInput { input: String, reason: InvalidAmount },
}

impl ConversionError {
    pub(crate) fn invalid(input: &str, reason: InvalidAmount) -> Self {
        ConversionError::InvalidInput {
            input: input.to_string(),
            reason,
        }
    }

    pub fn reason(&self) -> InvalidAmount {
        match self {
            ConversionError::InvalidInput { reason, .. } => *reason,
        }
    }
}

/// Result type for conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

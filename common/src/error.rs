//! Error types for shared RateCalc types.

use thiserror::Error;

/// Errors produced when normalizing a currency code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// Code was empty after trimming whitespace.
    #[error("Currency code cannot be empty")]
    Empty,

    /// Code contains characters other than ASCII letters.
    #[error("Currency code must be alphabetic: {0}")]
    NotAlphabetic(String),
}

/// Errors produced when assembling a rate table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateTableError {
    /// A table must carry at least one rate.
    #[error("Rate table for {base} has no rates")]
    Empty { base: String },

    /// Rate value is negative, NaN or infinite.
    #[error("Invalid rate {value} for {code}")]
    InvalidRate { code: String, value: f64 },

    /// Two keys normalized to the same code.
    #[error("Duplicate currency code in rate table: {code}")]
    DuplicateCode { code: String },

    /// A key could not be normalized.
    #[error("Invalid currency code in rate table: {0}")]
    InvalidCode(#[from] CodeError),
}

/// Result type alias for rate table construction.
pub type RateTableResult<T> = std::result::Result<T, RateTableError>;

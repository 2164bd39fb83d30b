//! Currency code type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CodeError;

/// A currency code, normalized to uppercase.
///
/// Codes entered by a user are compared case-insensitively: `"usd"`, `" Usd "`
/// and `"USD"` all normalize to the same value. Partially typed codes such as
/// `"EU"` are still valid codes; whether a code is *known* is decided by the
/// caller against a rate table or visible set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Normalize user input into a code. Rejects blank input.
    pub fn parse(text: &str) -> Result<Self, CodeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CodeError::Empty);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Normalize a code and require it to be purely alphabetic.
    ///
    /// Used for rate table keys, which always come from the provider.
    pub fn parse_alphabetic(text: &str) -> Result<Self, CodeError> {
        let code = Self::parse(text)?;
        if !code.0.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CodeError::NotAlphabetic(code.0));
        }
        Ok(code)
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code contains `needle`, ignoring case.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.0.contains(&needle.to_uppercase())
    }

    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn gbp() -> Self {
        Self("GBP".to_string())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Join codes with commas, the format the rate endpoint expects for targets.
pub fn join_codes<'a>(codes: impl IntoIterator<Item = &'a CurrencyCode>) -> String {
    codes
        .into_iter()
        .map(CurrencyCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

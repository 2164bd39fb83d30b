//! Fetched exchange rate tables.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::currency::CurrencyCode;
use crate::error::{RateTableError, RateTableResult};
use crate::time::{self, now, Timestamp};

/// An immutable snapshot of rates relative to one base currency.
///
/// A table always holds at least one rate. The base currency need not appear
/// as a key; its rate against itself is implicitly `1.0`.
///
/// Serialize-only: every table is built through a validating constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
    fetched_at: Timestamp,
    provider_updated_at: Option<Timestamp>,
}

impl RateTable {
    /// Create a table fetched now.
    pub fn new(base: CurrencyCode, rates: BTreeMap<CurrencyCode, f64>) -> RateTableResult<Self> {
        Self::with_fetch_time(base, rates, now())
    }

    /// Create a table with an explicit fetch time.
    pub fn with_fetch_time(
        base: CurrencyCode,
        rates: BTreeMap<CurrencyCode, f64>,
        fetched_at: Timestamp,
    ) -> RateTableResult<Self> {
        if rates.is_empty() {
            return Err(RateTableError::Empty {
                base: base.to_string(),
            });
        }

        if let Some((code, value)) = rates.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(RateTableError::InvalidRate {
                code: code.to_string(),
                value: *value,
            });
        }

        Ok(Self {
            base,
            rates,
            fetched_at,
            provider_updated_at: None,
        })
    }

    /// Build a table from raw `(code, value)` pairs, normalizing each code.
    ///
    /// Two keys that normalize to the same code (`"usd"` and `"USD"`) are
    /// rejected.
    pub fn from_pairs<'a>(
        base: CurrencyCode,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> RateTableResult<Self> {
        let mut rates = BTreeMap::new();
        for (raw, value) in pairs {
            let code = CurrencyCode::parse_alphabetic(raw)?;
            if rates.contains_key(&code) {
                return Err(RateTableError::DuplicateCode {
                    code: code.to_string(),
                });
            }
            rates.insert(code, value);
        }
        Self::new(base, rates)
    }

    /// Attach the provider's own "last updated" time.
    pub fn with_provider_updated_at(mut self, updated_at: Option<Timestamp>) -> Self {
        self.provider_updated_at = updated_at;
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<CurrencyCode, f64> {
        &self.rates
    }

    /// When this table was received locally.
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// When the provider last refreshed its data, if it said.
    pub fn provider_updated_at(&self) -> Option<Timestamp> {
        self.provider_updated_at
    }

    /// Whether the data is older than `max_age`.
    ///
    /// Measured from the provider's own update time when known, otherwise
    /// from when the table was fetched.
    pub fn is_stale(&self, max_age: std::time::Duration) -> bool {
        time::is_stale(self.provider_updated_at.unwrap_or(self.fetched_at), max_age)
    }

    /// Look up the rate for `code`, treating the base as `1.0` when absent.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if *code == self.base => Some(1.0),
            None => None,
        }
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    /// All codes in the table, alphabetically.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        self.rates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur_table() -> RateTable {
        RateTable::from_pairs(CurrencyCode::eur(), [("usd", 1.08), ("GBP", 0.86)]).unwrap()
    }

    #[test]
    fn test_rate_lookup() {
        let table = eur_table();

        assert_eq!(table.rate(&CurrencyCode::usd()), Some(1.08));
        assert_eq!(table.rate(&CurrencyCode::gbp()), Some(0.86));
        assert_eq!(table.rate(&CurrencyCode::parse("JPY").unwrap()), None);
    }

    #[test]
    fn test_base_is_implicitly_one() {
        let table = eur_table();
        assert!(!table.contains(&CurrencyCode::eur()));
        assert_eq!(table.rate(&CurrencyCode::eur()), Some(1.0));
    }

    #[test]
    fn test_codes_are_sorted() {
        let table = eur_table();
        assert_eq!(table.codes(), vec![CurrencyCode::gbp(), CurrencyCode::usd()]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = RateTable::new(CurrencyCode::eur(), BTreeMap::new());
        assert!(matches!(result, Err(RateTableError::Empty { .. })));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let result = RateTable::from_pairs(CurrencyCode::eur(), [("USD", f64::NAN)]);
        assert!(matches!(result, Err(RateTableError::InvalidRate { .. })));

        let result = RateTable::from_pairs(CurrencyCode::eur(), [("USD", -1.0)]);
        assert!(matches!(result, Err(RateTableError::InvalidRate { .. })));
    }

    #[test]
    fn test_staleness_prefers_provider_time() {
        let day = std::time::Duration::from_secs(24 * 3600);
        let table = eur_table();
        assert!(!table.is_stale(day));

        let old = now() - chrono::Duration::days(3);
        let table = table.with_provider_updated_at(Some(old));
        assert!(table.is_stale(day));

        let fetched_long_ago =
            RateTable::with_fetch_time(CurrencyCode::eur(), eur_table().rates().clone(), old)
                .unwrap();
        assert!(fetched_long_ago.is_stale(day));
    }

    #[test]
    fn test_duplicate_normalized_key_rejected() {
        let result = RateTable::from_pairs(CurrencyCode::eur(), [("usd", 1.08), ("USD", 1.09)]);
        assert_eq!(
            result,
            Err(RateTableError::DuplicateCode {
                code: "USD".to_string()
            })
        );
    }

    #[test]
    fn test_serializes_for_views() {
        let json = serde_json::to_value(eur_table()).unwrap();
        assert_eq!(json["base"], "EUR");
        assert_eq!(json["rates"]["USD"], 1.08);
    }

    #[test]
    fn test_non_alphabetic_key_rejected() {
        let result = RateTable::from_pairs(CurrencyCode::eur(), [("U5D", 1.0)]);
        assert!(matches!(result, Err(RateTableError::InvalidCode(_))));
    }
}

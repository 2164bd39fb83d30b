//! Wire format of the latest-rates endpoint.
//!
//! ```json
//! { "meta": { "last_updated_at": "2024-03-01T23:59:59Z" },
//!   "data": { "USD": { "code": "USD", "value": 1.08 } } }
//! ```
//!
//! Only `data[*].value` feeds the rate table. `meta.last_updated_at` is kept
//! as informational freshness when it parses.

use std::collections::HashMap;

use ratecalc_common::{parse_provider_timestamp, CurrencyCode, RateTable};
use serde::Deserialize;

use crate::error::{FxError, FxResult};

/// Latest-rates response body.
#[derive(Debug, Deserialize)]
pub struct LatestRatesResponse {
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
    pub data: HashMap<String, RateEntry>,
}

/// Response metadata.
#[derive(Debug, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub last_updated_at: Option<String>,
}

/// One currency's rate.
#[derive(Debug, Deserialize)]
pub struct RateEntry {
    /// Duplicates the map key.
    #[serde(default)]
    pub code: Option<String>,
    pub value: f64,
}

impl LatestRatesResponse {
    /// Convert into a rate table against `base`.
    pub fn into_rate_table(self, base: &CurrencyCode) -> FxResult<RateTable> {
        let updated_at = self
            .meta
            .and_then(|m| m.last_updated_at)
            .and_then(|ts| parse_provider_timestamp(&ts));

        let table = RateTable::from_pairs(
            base.clone(),
            self.data.iter().map(|(code, entry)| (code.as_str(), entry.value)),
        )
        .map_err(|e| FxError::from_table_error(base, e))?;

        Ok(table.with_provider_updated_at(updated_at))
    }
}

/// Decode a response body into a rate table.
pub fn decode_latest(base: &CurrencyCode, body: &str) -> FxResult<RateTable> {
    let response: LatestRatesResponse =
        serde_json::from_str(body).map_err(|e| FxError::MalformedPayload(e.to_string()))?;
    response.into_rate_table(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "meta": { "last_updated_at": "2024-03-01T23:59:59Z" },
        "data": {
            "GBP": { "code": "GBP", "value": 0.8563 },
            "USD": { "code": "USD", "value": 1.0812 }
        }
    }"#;

    #[test]
    fn test_decode_sample() {
        let table = decode_latest(&CurrencyCode::eur(), SAMPLE).unwrap();

        assert_eq!(table.base(), &CurrencyCode::eur());
        assert_eq!(table.rate(&CurrencyCode::usd()), Some(1.0812));
        assert_eq!(table.rate(&CurrencyCode::gbp()), Some(0.8563));
        assert_eq!(
            table.provider_updated_at().map(|t| t.to_rfc3339()),
            Some("2024-03-01T23:59:59+00:00".to_string())
        );
    }

    #[test]
    fn test_meta_is_optional() {
        let body = r#"{ "data": { "usd": { "value": 1.5 } } }"#;
        let table = decode_latest(&CurrencyCode::eur(), body).unwrap();

        assert_eq!(table.rate(&CurrencyCode::usd()), Some(1.5));
        assert!(table.provider_updated_at().is_none());
    }

    #[test]
    fn test_bad_timestamp_is_ignored() {
        let body = r#"{ "meta": { "last_updated_at": "soon" }, "data": { "USD": { "value": 1.5 } } }"#;
        let table = decode_latest(&CurrencyCode::eur(), body).unwrap();
        assert!(table.provider_updated_at().is_none());
    }

    #[test]
    fn test_empty_data_fails() {
        let body = r#"{ "meta": { "last_updated_at": "2024-03-01T23:59:59Z" }, "data": {} }"#;
        let result = decode_latest(&CurrencyCode::eur(), body);
        assert!(matches!(result, Err(FxError::EmptyRateTable(_))));
    }

    #[test]
    fn test_malformed_payloads_fail() {
        for body in [
            "",
            "not json",
            r#"{ "meta": {} }"#,
            r#"{ "data": { "USD": { "value": "1.08" } } }"#,
            r#"{ "data": { "USD": { "value": null } } }"#,
            r#"{ "data": { "US1": { "value": 1.0 } } }"#,
            r#"{ "data": { "USD": { "value": -1.0 } } }"#,
            r#"{ "data": { "usd": { "value": 1.08 }, "USD": { "value": 1.09 } } }"#,
        ] {
            let result = decode_latest(&CurrencyCode::eur(), body);
            assert!(
                matches!(result, Err(FxError::MalformedPayload(_))),
                "body {body:?} gave {result:?}"
            );
        }
    }
}

//! RateCalc FX Engine
//!
//! Amount conversion and exchange rate retrieval.
//!
//! # Features
//!
//! - Locale-invariant amount parsing with two-place, half-away-from-zero output
//! - Pass-through conversion when a target has no rate
//! - [`RateProvider`] seam with an HTTP implementation for currencyapi.com
//!
//! # Example
//!
//! ```rust,ignore
//! use ratecalc_fx::{convert, CurrencyApiProvider, ProviderConfig, RateProvider, RateQuery};
//! use ratecalc_common::CurrencyCode;
//!
//! let provider = CurrencyApiProvider::new(ProviderConfig::from_env())?;
//! let table = provider.latest_rates(&RateQuery::all(CurrencyCode::eur())).await?;
//!
//! let usd = convert("100", table.rates(), &CurrencyCode::usd())?;
//! ```

pub mod config;
pub mod conversion;
pub mod currencyapi;
pub mod error;
pub mod payload;
pub mod provider;

pub use config::ProviderConfig;
pub use conversion::{convert, format_amount, parse_amount, ConversionSummary};
pub use currencyapi::CurrencyApiProvider;
pub use error::{ConversionError, ConversionResult, FxError, FxResult, InvalidAmount};
pub use provider::{RateProvider, RateQuery};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::{GatedRateProvider, MockRateProvider, PendingFetch};

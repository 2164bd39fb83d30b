//! RateCalc Common Types
//!
//! Shared types used across the RateCalc workspace: normalized currency
//! codes, fetched rate tables, and timestamp helpers.

pub mod currency;
pub mod error;
pub mod rates;
pub mod time;

pub use currency::*;
pub use error::*;
pub use rates::*;
pub use time::*;

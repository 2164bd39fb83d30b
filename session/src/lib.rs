//! RateCalc Session
//!
//! Presentation-session state for the converter: what the user has selected,
//! whether rates are loading, loaded or failed, and when a base change should
//! refetch.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratecalc_fx::{CurrencyApiProvider, ProviderConfig};
//! use ratecalc_session::{ConverterSession, SessionConfig};
//!
//! let provider = Arc::new(CurrencyApiProvider::new(ProviderConfig::from_env())?);
//! let session = ConverterSession::new(provider, SessionConfig::default())?;
//!
//! session.load_rates().await;
//! session.set_amount_text("100");
//! let result = session.calculate()?;
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod selection;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use fetch::{FetchStateMachine, FetchStatus, FetchStatusKind, FetchTicket, Resolution};
pub use selection::{filter_codes, LastResult, SelectionStore};
pub use session::{ConverterSession, ResultView, SessionView};

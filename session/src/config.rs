//! Session configuration.

use std::time::Duration;

use ratecalc_common::CurrencyCode;

/// Defaults applied when a session is created.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial base currency.
    pub default_base: CurrencyCode,
    /// Initial target currency.
    pub default_target: CurrencyCode,
    /// Initial set of codes offered in pickers.
    pub default_visible: Vec<CurrencyCode>,
    /// Base used when loading the full currency catalog.
    pub catalog_base: CurrencyCode,
    /// Upper bound on a single fetch, provider time included.
    pub fetch_timeout: Duration,
    /// Rates older than this are flagged as stale in views.
    pub stale_after: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_base: CurrencyCode::eur(),
            default_target: CurrencyCode::usd(),
            default_visible: vec![CurrencyCode::eur(), CurrencyCode::gbp(), CurrencyCode::usd()],
            catalog_base: CurrencyCode::eur(),
            fetch_timeout: Duration::from_secs(15),
            stale_after: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// Values that fail to parse keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("RATECALC_DEFAULT_BASE") {
            if let Ok(code) = CurrencyCode::parse(&base) {
                config.default_base = code;
            }
        }

        if let Ok(target) = std::env::var("RATECALC_DEFAULT_TARGET") {
            if let Ok(code) = CurrencyCode::parse(&target) {
                config.default_target = code;
            }
        }

        if let Ok(visible) = std::env::var("RATECALC_VISIBLE") {
            if let Some(codes) = parse_code_list(&visible) {
                config.default_visible = codes;
            }
        }

        if let Ok(secs) = std::env::var("RATECALC_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("RATECALC_STALE_AFTER_SECS") {
            if let Ok(secs) = secs.parse() {
                config.stale_after = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be zero".to_string());
        }

        if self.stale_after.is_zero() {
            return Err("Staleness threshold cannot be zero".to_string());
        }

        Ok(())
    }
}

/// Parse a comma-separated code list. `None` if any entry is blank.
pub fn parse_code_list(text: &str) -> Option<Vec<CurrencyCode>> {
    text.split(',')
        .map(|code| CurrencyCode::parse(code).ok())
        .collect()
}

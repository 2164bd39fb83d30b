//! Rate provider configuration.

use std::time::Duration;

/// Configuration for the HTTP rate provider.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Root URL of the rates API.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.currencyapi.com/".to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CURRENCYAPI_URL") {
            config.base_url = url;
        }

        if let Ok(key) = std::env::var("CURRENCYAPI_KEY") {
            config.api_key = key;
        }

        if let Ok(secs) = std::env::var("CURRENCYAPI_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Rates API URL cannot be empty".to_string());
        }

        if self.api_key.is_empty() {
            return Err("Rates API key cannot be empty".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_key() {
        let config = ProviderConfig::default();
        assert!(config.validate().is_err());

        let config = ProviderConfig {
            api_key: "key".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ProviderConfig {
            api_key: "key".to_string(),
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: "cur_live_secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("cur_live_secret"));
    }
}

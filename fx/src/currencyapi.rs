//! HTTP rate provider for currencyapi.com.

use async_trait::async_trait;
use ratecalc_common::RateTable;
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{FxError, FxResult};
use crate::payload::decode_latest;
use crate::provider::{RateProvider, RateQuery};

const LATEST_PATH: &str = "v3/latest";

/// Longest error body kept on a [`FxError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Fetches latest rates from the `v3/latest` endpoint.
pub struct CurrencyApiProvider {
    http: Client,
    endpoint: Url,
    config: ProviderConfig,
}

impl CurrencyApiProvider {
    /// Create a provider from validated configuration.
    pub fn new(config: ProviderConfig) -> FxResult<Self> {
        config.validate().map_err(FxError::Configuration)?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FxError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = Url::parse(&config.base_url)
            .and_then(|url| url.join(LATEST_PATH))
            .map_err(|e| FxError::Configuration(format!("Invalid rates API URL: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Full request URL for a query, including the API key.
    pub fn request_url(&self, query: &RateQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("apikey", &self.config.api_key);
            params.append_pair("base_currency", query.base.as_str());
            if let Some(targets) = query.targets_param() {
                params.append_pair("currencies", &targets);
            }
        }
        url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FxError {
        if err.is_timeout() {
            FxError::Timeout(self.config.request_timeout)
        } else {
            // Drop the URL from the message; it carries the API key.
            FxError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl RateProvider for CurrencyApiProvider {
    fn name(&self) -> &str {
        "currencyapi"
    }

    #[instrument(skip(self), fields(query = %query))]
    async fn latest_rates(&self, query: &RateQuery) -> FxResult<RateTable> {
        let response = self
            .http
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Rates API returned error status");
            let body = (!body.is_empty()).then(|| body.chars().take(MAX_ERROR_BODY).collect());
            return Err(FxError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let table = decode_latest(&query.base, &body)?;
        debug!(rates = table.len(), "Decoded rate table");
        Ok(table)
    }
}

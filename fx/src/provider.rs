//! Rate provider trait and test doubles.

use async_trait::async_trait;
use ratecalc_common::{join_codes, CurrencyCode, RateTable};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FxResult;

/// What to fetch: a base currency and an optional list of targets.
///
/// An empty target list asks for every currency the provider knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuery {
    pub base: CurrencyCode,
    pub targets: Vec<CurrencyCode>,
}

impl RateQuery {
    /// Query for all available currencies against `base`.
    pub fn all(base: CurrencyCode) -> Self {
        Self {
            base,
            targets: Vec::new(),
        }
    }

    /// Query for specific targets against `base`.
    pub fn with_targets(
        base: CurrencyCode,
        targets: impl IntoIterator<Item = CurrencyCode>,
    ) -> Self {
        Self {
            base,
            targets: targets.into_iter().collect(),
        }
    }

    /// Comma-joined targets, or `None` when all currencies are requested.
    pub fn targets_param(&self) -> Option<String> {
        if self.targets.is_empty() {
            None
        } else {
            Some(join_codes(&self.targets))
        }
    }
}

impl fmt::Display for RateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.targets_param() {
            Some(targets) => write!(f, "{} -> [{}]", self.base, targets),
            None => write!(f, "{} -> [*]", self.base),
        }
    }
}

/// Source of rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest rates for a query.
    ///
    /// Any transport, status or payload problem is an error; a partial table
    /// is never returned.
    async fn latest_rates(&self, query: &RateQuery) -> FxResult<RateTable>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{GatedRateProvider, MockRateProvider, PendingFetch};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::FxError;
    use dashmap::DashMap;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot, Mutex};

    /// Mock rate provider serving fixed tables per base.
    pub struct MockRateProvider {
        name: String,
        tables: DashMap<CurrencyCode, BTreeMap<CurrencyCode, f64>>,
        failure: DashMap<CurrencyCode, FxError>,
        calls: AtomicUsize,
    }

    impl MockRateProvider {
        /// Create a new mock provider.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                tables: DashMap::new(),
                failure: DashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        /// Set the rates served for `base`.
        pub fn set_rates(&self, base: &str, rates: &[(&str, f64)]) {
            let base = CurrencyCode::parse(base).expect("valid base");
            let rates = rates
                .iter()
                .map(|(code, value)| (CurrencyCode::parse(code).expect("valid code"), *value))
                .collect();
            self.tables.insert(base, rates);
        }

        /// Make every request for `base` fail with `error`.
        pub fn fail_base(&self, base: &str, error: FxError) {
            let base = CurrencyCode::parse(base).expect("valid base");
            self.failure.insert(base, error);
        }

        /// Stop failing requests for `base`.
        pub fn recover_base(&self, base: &str) {
            if let Ok(base) = CurrencyCode::parse(base) {
                self.failure.remove(&base);
            }
        }

        /// Number of fetches served so far.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn latest_rates(&self, query: &RateQuery) -> FxResult<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = self.failure.get(&query.base) {
                return Err(error.clone());
            }

            let rates = self
                .tables
                .get(&query.base)
                .map(|r| r.clone())
                .ok_or_else(|| FxError::ProviderError(format!("no rates for {}", query.base)))?;

            let rates: BTreeMap<_, _> = if query.targets.is_empty() {
                rates
            } else {
                rates
                    .into_iter()
                    .filter(|(code, _)| query.targets.contains(code))
                    .collect()
            };

            RateTable::new(query.base.clone(), rates)
                .map_err(|e| FxError::from_table_error(&query.base, e))
        }
    }

    /// A fetch held open by [`GatedRateProvider`] until the test replies.
    pub struct PendingFetch {
        pub query: RateQuery,
        reply: oneshot::Sender<FxResult<RateTable>>,
    }

    impl PendingFetch {
        /// Resolve the fetch. Ignored if the caller has gone away.
        pub fn respond(self, result: FxResult<RateTable>) {
            let _ = self.reply.send(result);
        }
    }

    /// Provider whose calls block until the test resolves them, in any order.
    pub struct GatedRateProvider {
        pending_tx: mpsc::UnboundedSender<PendingFetch>,
        pending_rx: Mutex<mpsc::UnboundedReceiver<PendingFetch>>,
    }

    impl GatedRateProvider {
        pub fn new() -> Self {
            let (pending_tx, pending_rx) = mpsc::unbounded_channel();
            Self {
                pending_tx,
                pending_rx: Mutex::new(pending_rx),
            }
        }

        /// Wait for the next call to reach the provider.
        pub async fn next_call(&self) -> PendingFetch {
            self.pending_rx
                .lock()
                .await
                .recv()
                .await
                .expect("provider sender lives as long as the provider")
        }
    }

    impl Default for GatedRateProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl RateProvider for GatedRateProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn latest_rates(&self, query: &RateQuery) -> FxResult<RateTable> {
            let (reply, response) = oneshot::channel();
            self.pending_tx
                .send(PendingFetch {
                    query: query.clone(),
                    reply,
                })
                .map_err(|_| FxError::ProviderError("gate closed".to_string()))?;

            response
                .await
                .map_err(|_| FxError::ProviderError("fetch abandoned".to_string()))?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;

    #[test]
    fn test_targets_param() {
        let all = RateQuery::all(CurrencyCode::eur());
        assert_eq!(all.targets_param(), None);
        assert_eq!(all.to_string(), "EUR -> [*]");

        let some = RateQuery::with_targets(
            CurrencyCode::eur(),
            [CurrencyCode::gbp(), CurrencyCode::usd()],
        );
        assert_eq!(some.targets_param().as_deref(), Some("GBP,USD"));
        assert_eq!(some.to_string(), "EUR -> [GBP,USD]");
    }

    #[tokio::test]
    async fn test_mock_provider_filters_targets() {
        let provider = MockRateProvider::new("test");
        provider.set_rates("EUR", &[("USD", 1.08), ("GBP", 0.86), ("JPY", 161.2)]);

        let query = RateQuery::with_targets(CurrencyCode::eur(), [CurrencyCode::usd()]);
        let table = provider.latest_rates(&query).await.unwrap();

        assert_eq!(table.base(), &CurrencyCode::eur());
        assert_eq!(table.codes(), vec![CurrencyCode::usd()]);
        assert_eq!(provider.call_count(), 1);

        let table = provider.latest_rates(&RateQuery::all(CurrencyCode::eur())).await.unwrap();
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_failure() {
        let provider = MockRateProvider::new("test");
        provider.set_rates("EUR", &[("USD", 1.08)]);
        provider.fail_base("EUR", FxError::Transport("connection reset".into()));

        let result = provider.latest_rates(&RateQuery::all(CurrencyCode::eur())).await;
        assert!(matches!(result, Err(FxError::Transport(_))));

        provider.recover_base("EUR");
        assert!(provider.latest_rates(&RateQuery::all(CurrencyCode::eur())).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_empty_filter_is_an_error() {
        let provider = MockRateProvider::new("test");
        provider.set_rates("EUR", &[("USD", 1.08)]);

        let query = RateQuery::with_targets(CurrencyCode::eur(), [CurrencyCode::gbp()]);
        let result = provider.latest_rates(&query).await;
        assert!(matches!(result, Err(FxError::EmptyRateTable(_))));
    }

    #[tokio::test]
    async fn test_gated_provider_resolves_out_of_order() {
        use std::sync::Arc;

        let provider = Arc::new(GatedRateProvider::new());

        let first = tokio::spawn({
            let provider = provider.clone();
            async move { provider.latest_rates(&RateQuery::all(CurrencyCode::eur())).await }
        });
        let call_a = provider.next_call().await;

        let second = tokio::spawn({
            let provider = provider.clone();
            async move { provider.latest_rates(&RateQuery::all(CurrencyCode::usd())).await }
        });
        let call_b = provider.next_call().await;

        call_b.respond(RateTable::from_pairs(CurrencyCode::usd(), [("EUR", 0.92)]).map_err(
            |e| FxError::MalformedPayload(e.to_string()),
        ));
        let b = second.await.unwrap().unwrap();
        assert_eq!(b.base(), &CurrencyCode::usd());

        call_a.respond(Err(FxError::Transport("late".into())));
        assert!(first.await.unwrap().is_err());
    }
}

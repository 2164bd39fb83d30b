//! One converter session: selection, fetch status and a rate provider.

use std::sync::Arc;

use parking_lot::Mutex;
use ratecalc_common::{age, CurrencyCode, Timestamp};
use ratecalc_fx::{ConversionSummary, FxError, RateProvider, RateQuery};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::fetch::{FetchStateMachine, FetchStatus, FetchStatusKind, FetchTicket, Resolution};
use crate::selection::{LastResult, SelectionStore};

/// State for one UI session.
///
/// Each session owns its selection and fetch state; nothing is shared between
/// sessions. Locks are never held across the provider call.
pub struct ConverterSession {
    provider: Arc<dyn RateProvider>,
    config: SessionConfig,
    selection: Mutex<SelectionStore>,
    fetch: Mutex<FetchStateMachine>,
}

impl ConverterSession {
    /// Create a session from validated configuration.
    pub fn new(provider: Arc<dyn RateProvider>, config: SessionConfig) -> SessionResult<Self> {
        config.validate().map_err(SessionError::Configuration)?;

        let selection = SelectionStore::new(
            config.default_base.clone(),
            config.default_target.clone(),
            config.default_visible.iter().cloned(),
        );

        info!(
            provider = provider.name(),
            base = %config.default_base,
            target = %config.default_target,
            "Converter session created"
        );

        Ok(Self {
            provider,
            config,
            selection: Mutex::new(selection),
            fetch: Mutex::new(FetchStateMachine::new()),
        })
    }

    // --- fetching ---

    /// Issue a request without waiting for it. The session is `Loading` on return.
    pub fn begin_fetch(&self, query: RateQuery) -> FetchTicket {
        self.fetch.lock().request(query)
    }

    /// Run an issued request against the provider and apply its outcome.
    #[instrument(skip(self, ticket), fields(seq = ticket.seq()))]
    pub async fn complete_fetch(&self, ticket: FetchTicket) -> Resolution {
        let outcome = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.latest_rates(ticket.query()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(FxError::Timeout(self.config.fetch_timeout)),
        };

        self.fetch.lock().resolve(&ticket, outcome)
    }

    /// Issue a request and wait for it.
    pub async fn fetch(&self, query: RateQuery) -> Resolution {
        let ticket = self.begin_fetch(query);
        self.complete_fetch(ticket).await
    }

    /// Issue a request now and complete it on a background task.
    pub fn spawn_fetch(self: &Arc<Self>, query: RateQuery) -> JoinHandle<Resolution> {
        let ticket = self.begin_fetch(query);
        let session = Arc::clone(self);
        tokio::spawn(async move { session.complete_fetch(ticket).await })
    }

    /// Query for the current base against the visible codes.
    pub fn rates_query(&self) -> RateQuery {
        let selection = self.selection.lock();
        RateQuery::with_targets(
            selection.base().clone(),
            selection.visible_codes().iter().cloned(),
        )
    }

    /// Fetch rates for the current base and visible codes.
    pub async fn load_rates(&self) -> Resolution {
        let query = self.rates_query();
        self.fetch(query).await
    }

    /// Fetch every available currency, for building the visible-code list.
    pub async fn load_catalog(&self) -> Resolution {
        self.fetch(RateQuery::all(self.config.catalog_base.clone()))
            .await
    }

    // --- selection ---

    pub fn set_amount_text(&self, text: impl Into<String>) {
        self.selection.lock().set_amount_text(text);
    }

    /// Change the base currency.
    ///
    /// Returns the query to run when the change should trigger a refetch:
    /// rates have loaded before and the new base is a visible code.
    pub fn set_base(&self, text: &str) -> SessionResult<Option<RateQuery>> {
        let mut selection = self.selection.lock();
        if !selection.set_base(text)? {
            return Ok(None);
        }

        let fetch = self.fetch.lock();
        if !fetch.should_auto_refetch(selection.base(), selection.visible_codes()) {
            debug!(base = %selection.base(), "Base changed without refetch");
            return Ok(None);
        }

        Ok(Some(RateQuery::with_targets(
            selection.base().clone(),
            selection.visible_codes().iter().cloned(),
        )))
    }

    /// Change the base currency and run any triggered refetch.
    pub async fn change_base(&self, text: &str) -> SessionResult<Option<Resolution>> {
        match self.set_base(text)? {
            Some(query) => Ok(Some(self.fetch(query).await)),
            None => Ok(None),
        }
    }

    pub fn set_target(&self, text: &str) -> SessionResult<()> {
        self.selection.lock().set_target(text)?;
        Ok(())
    }

    pub fn set_visible_codes(&self, codes: impl IntoIterator<Item = CurrencyCode>) {
        self.selection.lock().set_visible_codes(codes);
    }

    pub fn toggle_visible(&self, code: CurrencyCode, visible: bool) {
        self.selection.lock().toggle_visible(code, visible);
    }

    /// Convert the current amount with the loaded rates and store the result.
    ///
    /// An unparseable amount is a result (`Invalid`), not an error.
    pub fn calculate(&self) -> SessionResult<LastResult> {
        let table = self
            .fetch
            .lock()
            .status()
            .table()
            .cloned()
            .ok_or(SessionError::RatesNotLoaded)?;

        let mut selection = self.selection.lock();
        let result = match ConversionSummary::compute(
            selection.amount_text(),
            selection.base(),
            table.rates(),
            selection.target(),
        ) {
            Ok(summary) => LastResult::Converted(summary),
            Err(err) => LastResult::Invalid(err),
        };

        selection.set_last_result(result.clone());
        Ok(result)
    }

    // --- queries ---

    pub fn status(&self) -> FetchStatus {
        self.fetch.lock().status().clone()
    }

    pub fn has_loaded_rates(&self) -> bool {
        self.fetch.lock().has_loaded_rates()
    }

    pub fn selection(&self) -> SelectionStore {
        self.selection.lock().clone()
    }

    /// Every code in the loaded table, alphabetically. Empty unless loaded.
    pub fn available_codes(&self) -> Vec<CurrencyCode> {
        self.fetch
            .lock()
            .status()
            .table()
            .map(|table| table.codes())
            .unwrap_or_default()
    }

    /// Picker options for the typed text.
    pub fn dropdown_options(&self, typed: &str) -> Vec<CurrencyCode> {
        self.selection.lock().dropdown_options(typed)
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> SessionView {
        let status = self.status();
        let selection = self.selection();

        SessionView {
            status: status.kind(),
            base: selection.base().clone(),
            target: selection.target().clone(),
            amount_text: selection.amount_text().to_string(),
            options: selection.dropdown_options(""),
            result: ResultView::from(selection.last_result()),
            rates_fetched_at: status.table().map(|t| t.fetched_at()),
            rates_updated_at: status.table().and_then(|t| t.provider_updated_at()),
            rates_age_secs: status.table().map(|t| age(t.fetched_at()).num_seconds()),
            rates_stale: status
                .table()
                .is_some_and(|t| t.is_stale(self.config.stale_after)),
            error: status.error().map(|e| e.to_string()),
            retryable: status.error().map(FxError::is_retryable).unwrap_or(false),
        }
    }
}

/// What a front end needs to draw one frame.
///
/// `status` picks the screen: `Idle` prompts to fetch, `Loading` waits,
/// `Failed` shows the error with a base picker, `Success` shows the converter.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub status: FetchStatusKind,
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount_text: String,
    pub options: Vec<CurrencyCode>,
    pub result: ResultView,
    pub rates_fetched_at: Option<Timestamp>,
    pub rates_updated_at: Option<Timestamp>,
    /// Seconds since the table was received.
    pub rates_age_secs: Option<i64>,
    /// Provider data is older than the configured threshold.
    pub rates_stale: bool,
    pub error: Option<String>,
    pub retryable: bool,
}

/// Serializable form of [`LastResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Empty,
    Converted { summary: String, value: String },
    Invalid,
}

impl From<&LastResult> for ResultView {
    fn from(result: &LastResult) -> Self {
        match result {
            LastResult::Empty => ResultView::Empty,
            LastResult::Converted(summary) => ResultView::Converted {
                summary: summary.to_string(),
                value: summary.result.clone(),
            },
            LastResult::Invalid(_) => ResultView::Invalid,
        }
    }
}

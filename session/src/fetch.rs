//! Rate fetch state machine.
//!
//! ```text
//!   Idle ──request──▶ Loading ──ok──▶ Success
//!                      │  ▲   └─err─▶ Failed
//!                      └──┘ request     │
//!   Success / Failed ──request──▶ Loading
//! ```
//!
//! Every request takes the next sequence number. A response is applied only
//! if its number is the latest issued, so a slow response to an old request
//! can never overwrite a newer one.

use std::collections::BTreeSet;
use std::sync::Arc;

use ratecalc_common::{CurrencyCode, RateTable};
use ratecalc_fx::{FxError, FxResult, RateQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fetch status without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatusKind {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// Latest request produced a rate table.
    Success,
    /// Latest request failed.
    Failed,
}

impl FetchStatusKind {
    /// Get valid next states from current state.
    pub fn valid_transitions(&self) -> &[FetchStatusKind] {
        match self {
            FetchStatusKind::Idle => &[FetchStatusKind::Loading],
            FetchStatusKind::Loading => &[
                FetchStatusKind::Loading,
                FetchStatusKind::Success,
                FetchStatusKind::Failed,
            ],
            FetchStatusKind::Success => &[FetchStatusKind::Loading],
            FetchStatusKind::Failed => &[FetchStatusKind::Loading],
        }
    }

    /// Check if transition to given state is valid.
    pub fn can_transition_to(&self, next: FetchStatusKind) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Current fetch status.
#[derive(Debug, Clone, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success(Arc<RateTable>),
    Failed(FxError),
}

impl FetchStatus {
    pub fn kind(&self) -> FetchStatusKind {
        match self {
            FetchStatus::Idle => FetchStatusKind::Idle,
            FetchStatus::Loading => FetchStatusKind::Loading,
            FetchStatus::Success(_) => FetchStatusKind::Success,
            FetchStatus::Failed(_) => FetchStatusKind::Failed,
        }
    }

    /// Rate table, when the latest fetch succeeded.
    pub fn table(&self) -> Option<&Arc<RateTable>> {
        match self {
            FetchStatus::Success(table) => Some(table),
            FetchStatus::Idle | FetchStatus::Loading | FetchStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FxError> {
        match self {
            FetchStatus::Failed(err) => Some(err),
            FetchStatus::Idle | FetchStatus::Loading | FetchStatus::Success(_) => None,
        }
    }
}

/// Handle for one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    query: RateQuery,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &RateQuery {
        &self.query
    }
}

/// What happened to a response handed to [`FetchStateMachine::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Response was current and moved the machine to this state.
    Applied(FetchStatusKind),
    /// A newer request was issued; the response was dropped.
    Superseded { seq: u64, latest: u64 },
}

/// Tracks the status of rate fetches for one session.
#[derive(Debug, Default)]
pub struct FetchStateMachine {
    status: FetchStatus,
    has_loaded_rates: bool,
    latest_seq: u64,
}

impl FetchStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Whether any fetch has ever succeeded. Never resets.
    pub fn has_loaded_rates(&self) -> bool {
        self.has_loaded_rates
    }

    /// Sequence number of the latest issued request, 0 if none.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Issue a request. Moves to `Loading` from any state.
    pub fn request(&mut self, query: RateQuery) -> FetchTicket {
        self.latest_seq += 1;
        let superseded = self.status.kind() == FetchStatusKind::Loading;
        self.transition(FetchStatus::Loading);

        info!(
            seq = self.latest_seq,
            query = %query,
            superseded,
            "Rate fetch requested"
        );

        FetchTicket {
            seq: self.latest_seq,
            query,
        }
    }

    /// Apply the outcome of a request, unless a newer one has been issued.
    pub fn resolve(&mut self, ticket: &FetchTicket, outcome: FxResult<RateTable>) -> Resolution {
        if ticket.seq != self.latest_seq || self.status.kind() != FetchStatusKind::Loading {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding stale rate response"
            );
            return Resolution::Superseded {
                seq: ticket.seq,
                latest: self.latest_seq,
            };
        }

        match outcome {
            Ok(table) => {
                info!(
                    seq = ticket.seq,
                    base = %table.base(),
                    rates = table.len(),
                    "Rate fetch succeeded"
                );
                self.has_loaded_rates = true;
                self.transition(FetchStatus::Success(Arc::new(table)));
            }
            Err(err) => {
                warn!(
                    seq = ticket.seq,
                    query = %ticket.query,
                    error = %err,
                    code = err.error_code(),
                    "Rate fetch failed"
                );
                self.transition(FetchStatus::Failed(err));
            }
        }

        Resolution::Applied(self.status.kind())
    }

    /// Whether switching the base to `new_base` should trigger a fetch.
    ///
    /// Only after a first successful load, and only for codes the user has
    /// made visible. Partially typed codes never match.
    pub fn should_auto_refetch(
        &self,
        new_base: &CurrencyCode,
        visible: &BTreeSet<CurrencyCode>,
    ) -> bool {
        self.has_loaded_rates && visible.contains(new_base)
    }

    fn transition(&mut self, next: FetchStatus) {
        debug_assert!(
            self.status.kind().can_transition_to(next.kind()),
            "invalid fetch transition {:?} -> {:?}",
            self.status.kind(),
            next.kind()
        );
        self.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(base: &str, rates: &[(&str, f64)]) -> RateTable {
        RateTable::from_pairs(CurrencyCode::parse(base).unwrap(), rates.iter().copied()).unwrap()
    }

    fn query(base: &str) -> RateQuery {
        RateQuery::all(CurrencyCode::parse(base).unwrap())
    }

    fn visible() -> BTreeSet<CurrencyCode> {
        [CurrencyCode::eur(), CurrencyCode::gbp(), CurrencyCode::usd()]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_transitions() {
        assert!(FetchStatusKind::Idle.can_transition_to(FetchStatusKind::Loading));
        assert!(!FetchStatusKind::Idle.can_transition_to(FetchStatusKind::Success));
        assert!(!FetchStatusKind::Failed.can_transition_to(FetchStatusKind::Success));
        assert!(FetchStatusKind::Loading.can_transition_to(FetchStatusKind::Loading));
        assert!(FetchStatusKind::Success.can_transition_to(FetchStatusKind::Loading));
    }

    #[test]
    fn test_success_path() {
        let mut machine = FetchStateMachine::new();
        assert_eq!(machine.status().kind(), FetchStatusKind::Idle);

        let ticket = machine.request(query("EUR"));
        assert_eq!(ticket.seq(), 1);
        assert_eq!(machine.status().kind(), FetchStatusKind::Loading);

        let resolution = machine.resolve(&ticket, Ok(table("EUR", &[("USD", 1.08)])));
        assert_eq!(resolution, Resolution::Applied(FetchStatusKind::Success));
        assert!(machine.has_loaded_rates());
        assert_eq!(
            machine.status().table().unwrap().rate(&CurrencyCode::usd()),
            Some(1.08)
        );
    }

    #[test]
    fn test_failure_path() {
        let mut machine = FetchStateMachine::new();
        let ticket = machine.request(query("EUR"));

        let resolution = machine.resolve(&ticket, Err(FxError::Transport("down".into())));

        assert_eq!(resolution, Resolution::Applied(FetchStatusKind::Failed));
        assert!(!machine.has_loaded_rates());
        assert!(matches!(machine.status().error(), Some(FxError::Transport(_))));
    }

    #[test]
    fn test_has_loaded_rates_is_sticky() {
        let mut machine = FetchStateMachine::new();
        let ticket = machine.request(query("EUR"));
        machine.resolve(&ticket, Ok(table("EUR", &[("USD", 1.08)])));

        let ticket = machine.request(query("EUR"));
        machine.resolve(&ticket, Err(FxError::Transport("down".into())));

        assert_eq!(machine.status().kind(), FetchStatusKind::Failed);
        assert!(machine.has_loaded_rates());
    }

    #[test]
    fn test_late_response_to_old_request_is_discarded() {
        let mut machine = FetchStateMachine::new();
        let a = machine.request(query("EUR"));
        let b = machine.request(query("USD"));

        let resolution = machine.resolve(&b, Ok(table("USD", &[("EUR", 0.92)])));
        assert_eq!(resolution, Resolution::Applied(FetchStatusKind::Success));

        let resolution = machine.resolve(&a, Ok(table("EUR", &[("USD", 1.08)])));
        assert_eq!(resolution, Resolution::Superseded { seq: 1, latest: 2 });

        let current = machine.status().table().unwrap();
        assert_eq!(current.base(), &CurrencyCode::usd());
    }

    #[test]
    fn test_early_response_to_old_request_is_discarded() {
        let mut machine = FetchStateMachine::new();
        let a = machine.request(query("EUR"));
        let b = machine.request(query("USD"));

        let resolution = machine.resolve(&a, Ok(table("EUR", &[("USD", 1.08)])));
        assert!(matches!(resolution, Resolution::Superseded { .. }));
        assert_eq!(machine.status().kind(), FetchStatusKind::Loading);
        assert!(!machine.has_loaded_rates());

        machine.resolve(&b, Err(FxError::Timeout(std::time::Duration::from_secs(1))));
        assert_eq!(machine.status().kind(), FetchStatusKind::Failed);
    }

    #[test]
    fn test_duplicate_resolution_is_ignored() {
        let mut machine = FetchStateMachine::new();
        let ticket = machine.request(query("EUR"));
        machine.resolve(&ticket, Ok(table("EUR", &[("USD", 1.08)])));

        let resolution = machine.resolve(&ticket, Err(FxError::Transport("late".into())));
        assert!(matches!(resolution, Resolution::Superseded { .. }));
        assert_eq!(machine.status().kind(), FetchStatusKind::Success);
    }

    #[test]
    fn test_auto_refetch_rule() {
        let mut machine = FetchStateMachine::new();
        let visible = visible();

        assert!(!machine.should_auto_refetch(&CurrencyCode::gbp(), &visible));

        let ticket = machine.request(query("EUR"));
        machine.resolve(&ticket, Ok(table("EUR", &[("USD", 1.08)])));

        assert!(machine.should_auto_refetch(&CurrencyCode::gbp(), &visible));
        assert!(!machine.should_auto_refetch(&CurrencyCode::parse("GB").unwrap(), &visible));
        assert!(!machine.should_auto_refetch(&CurrencyCode::parse("JPY").unwrap(), &visible));
    }
}

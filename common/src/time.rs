//! Time utilities for rate freshness.

use chrono::{DateTime, Duration, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of a timestamp relative to now. Future timestamps have zero age.
pub fn age(timestamp: Timestamp) -> Duration {
    let diff = now() - timestamp;
    if diff < Duration::zero() {
        Duration::zero()
    } else {
        diff
    }
}

/// Check whether a timestamp is older than `max_age`.
///
/// A `max_age` too large for chrono never goes stale.
pub fn is_stale(timestamp: Timestamp, max_age: std::time::Duration) -> bool {
    match Duration::from_std(max_age) {
        Ok(max_age) => age(timestamp) > max_age,
        Err(_) => false,
    }
}

/// Parse an RFC 3339 timestamp as sent by rate providers.
///
/// Returns `None` rather than an error; provider timestamps are informational.
pub fn parse_provider_timestamp(text: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

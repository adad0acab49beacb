use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One validated contract, keyed by its target date.
///
/// `probability` is the price of the "Yes" outcome, read as the market's
/// cumulative estimate P(event <= resolved_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub label: String,
    pub resolved_date: NaiveDate,
    pub probability: f64,
    pub volume: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub outcome_token_id: Option<String>,
}

/// Labels that resolve to no usable date sort behind every real target
/// date instead of being dropped.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).unwrap()
}

/// Event-level header for one poll cycle. Owned by the cycle, never merged
/// with prior cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub title: String,
    pub total_volume: f64,
    pub total_liquidity: f64,
    pub start_date: Option<DateTime<Utc>>,
    /// Set when the whole fetch/decode cycle failed; independent of
    /// whether any records survived.
    pub error: Option<String>,
    /// Contracts skipped for malformation this cycle.
    pub dropped_records: usize,
}

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::data::gamma_api::GammaMarket;
use crate::data::types::{sentinel_date, MarketRecord};

/// Why one contract was left out of the cycle. Malformation is absorbed
/// here record by record; nothing propagates to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("market is closed or inactive")]
    Inactive,

    #[error("missing display title")]
    MissingTitle,

    #[error("malformed {field}: {source}")]
    MalformedField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no Yes outcome listed")]
    MissingYesOutcome,

    #[error("outcome and price arrays misaligned: {outcomes} vs {prices}")]
    MisalignedArrays { outcomes: usize, prices: usize },

    #[error("unparseable Yes price: {0}")]
    BadPrice(String),
}

/// Normalize every contract of one event snapshot.
///
/// Returns the surviving records in upstream order plus the count of
/// contracts dropped for malformation. Closed/inactive markets are
/// expected churn and are not counted as drops.
pub fn normalize_markets(markets: &[GammaMarket], target_year: i32) -> (Vec<MarketRecord>, usize) {
    let mut records = Vec::with_capacity(markets.len());
    let mut dropped = 0;

    for market in markets {
        match normalize_market(market, target_year) {
            Ok(record) => records.push(record),
            Err(SkipReason::Inactive) => {}
            Err(reason) => {
                dropped += 1;
                debug!("Skipping contract: {}", reason);
            }
        }
    }

    (records, dropped)
}

/// Convert one raw contract into a MarketRecord, or say why not.
pub fn normalize_market(
    market: &GammaMarket,
    target_year: i32,
) -> Result<MarketRecord, SkipReason> {
    if market.closed || !market.active {
        return Err(SkipReason::Inactive);
    }

    let label = market
        .group_item_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| market.question.as_deref().filter(|t| !t.trim().is_empty()))
        .ok_or(SkipReason::MissingTitle)?;

    let outcomes = decode_string_array(market.outcomes.as_deref(), "outcomes")?;
    let prices = decode_string_array(market.outcome_prices.as_deref(), "outcomePrices")?;

    if outcomes.len() != prices.len() {
        return Err(SkipReason::MisalignedArrays {
            outcomes: outcomes.len(),
            prices: prices.len(),
        });
    }

    let yes_idx = outcomes
        .iter()
        .position(|o| o == "Yes")
        .ok_or(SkipReason::MissingYesOutcome)?;

    let probability = prices[yes_idx]
        .trim()
        .parse::<f64>()
        .map_err(|_| SkipReason::BadPrice(prices[yes_idx].clone()))?
        .clamp(0.0, 1.0);

    // Token ids only matter to history retrieval; a short or malformed
    // array loses the id, not the record.
    let outcome_token_id = market
        .clob_token_ids
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .and_then(|ids| ids.get(yes_idx).cloned());

    let best_bid = market.best_bid.unwrap_or(0.0);
    let best_ask = market.best_ask.unwrap_or(0.0);
    let spread = if best_bid > 0.0 && best_ask > 0.0 {
        (best_ask - best_bid).max(0.0)
    } else {
        0.0
    };

    Ok(MarketRecord {
        label: label.to_string(),
        resolved_date: resolve_target_date(label, target_year),
        probability,
        volume: market.volume.unwrap_or(0.0),
        liquidity: market.liquidity.unwrap_or(0.0),
        spread,
        outcome_token_id,
    })
}

/// Strict decode of an upstream string-encoded JSON array. Upstream is
/// untrusted; anything that is not literally an array of strings is a
/// malformed field.
fn decode_string_array(
    raw: Option<&str>,
    field: &'static str,
) -> Result<Vec<String>, SkipReason> {
    serde_json::from_str(raw.unwrap_or("[]"))
        .map_err(|source| SkipReason::MalformedField { field, source })
}

// chrono accepts full month names for %b during parsing, so one pattern
// per punctuation shape covers "Feb 15, 2026" and "March 15, 2026" alike.
const DATED_FORMATS: &[&str] = &["%b %d, %Y", "%b %d %Y"];

/// Resolve a contract label to its target date.
///
/// Fallback chain: exact formats first, with year 1900 standing in for
/// year-less labels and rewritten to the event's target year; then a scan
/// for a month abbreviation plus a day number; finally the sentinel. An
/// unresolvable date is a display problem, not a data problem, so the
/// record is never dropped here.
pub fn resolve_target_date(label: &str, target_year: i32) -> NaiveDate {
    let trimmed = label.trim();

    for format in DATED_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return if date.year() == 1900 {
                with_target_year(date, target_year)
            } else {
                date
            };
        }
    }

    let padded = format!("{} 1900", trimmed);
    for format in DATED_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&padded, format) {
            return with_target_year(date, target_year);
        }
    }

    scan_month_and_day(trimmed, target_year).unwrap_or_else(sentinel_date)
}

fn with_target_year(date: NaiveDate, target_year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(target_year, date.month(), date.day())
        .unwrap_or_else(sentinel_date)
}

const MONTH_ABBREVS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Last-resort scan: any known month abbreviation anywhere in the label,
/// first run of digits as the day.
fn scan_month_and_day(label: &str, target_year: i32) -> Option<NaiveDate> {
    let lower = label.to_lowercase();

    let month = MONTH_ABBREVS
        .iter()
        .position(|abbrev| lower.contains(abbrev))
        .map(|idx| idx as u32 + 1)?;

    let digits = regex::Regex::new(r"\d+").ok()?;
    let day: u32 = digits.find(&lower)?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(target_year, month, day)
}

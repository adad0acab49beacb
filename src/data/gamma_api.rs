use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub struct GammaApiClient {
    client: Client,
    base_url: String,
}

/// Event object as the Gamma events endpoint returns it, element [0] of
/// the response array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GammaEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// Raw per-contract payload. `outcomes`, `outcomePrices` and
/// `clobTokenIds` arrive as strings containing JSON array literals and are
/// decoded strictly by the normalizer, never evaluated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GammaMarket {
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default, rename = "groupItemTitle")]
    pub group_item_title: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub outcomes: Option<String>,
    #[serde(default, rename = "outcomePrices")]
    pub outcome_prices: Option<String>,
    #[serde(default, rename = "clobTokenIds")]
    pub clob_token_ids: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,
    #[serde(default, rename = "bestBid", deserialize_with = "lenient_f64")]
    pub best_bid: Option<f64>,
    #[serde(default, rename = "bestAsk", deserialize_with = "lenient_f64")]
    pub best_ask: Option<f64>,
}

/// Gamma sends numeric fields as either JSON numbers or numeric strings
/// depending on the endpoint version. Anything else decodes to None.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Seam for the market fetch so the cached pipeline can be exercised
/// without the network.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_event(&self, slug: &str) -> Result<Option<GammaEvent>>;
}

impl GammaApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl EventSource for GammaApiClient {
    /// One bounded request for the event behind `slug`. A non-200 status
    /// or empty response array is `Ok(None)`; transport and body-decode
    /// failures surface as errors for the caller to fold into EventMeta.
    async fn fetch_event(&self, slug: &str) -> Result<Option<GammaEvent>> {
        let url = format!("{}/events?slug={}", self.base_url, slug);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach gamma events endpoint")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let mut events: Vec<GammaEvent> = response
            .json()
            .await
            .context("Failed to decode gamma events response")?;

        if events.is_empty() {
            Ok(None)
        } else {
            Ok(Some(events.remove(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numeric_fields() {
        let raw = r#"{
            "closed": false,
            "active": true,
            "volume": "12345.5",
            "liquidity": 678.25,
            "bestBid": null,
            "bestAsk": "0.47"
        }"#;

        let market: GammaMarket = serde_json::from_str(raw).unwrap();
        assert_eq!(market.volume, Some(12345.5));
        assert_eq!(market.liquidity, Some(678.25));
        assert_eq!(market.best_bid, None);
        assert_eq!(market.best_ask, Some(0.47));
    }

    #[test]
    fn test_event_decode_defaults() {
        let raw = r#"[{"title": "US strikes Iran by...", "markets": []}]"#;

        let events: Vec<GammaEvent> = serde_json::from_str(raw).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "US strikes Iran by...");
        assert!(events[0].markets.is_empty());
        assert_eq!(events[0].volume, None);
    }

    #[test]
    fn test_market_decode_keeps_encoded_arrays_verbatim() {
        let raw = r#"{
            "active": true,
            "groupItemTitle": "Feb 15",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.42\", \"0.58\"]"
        }"#;

        let market: GammaMarket = serde_json::from_str(raw).unwrap();
        assert_eq!(market.outcomes.as_deref(), Some("[\"Yes\", \"No\"]"));
        assert_eq!(market.outcome_prices.as_deref(), Some("[\"0.42\", \"0.58\"]"));
        assert_eq!(market.clob_token_ids, None);
    }
}

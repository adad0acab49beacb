use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub event: EventConfig,
    pub endpoints: EndpointsConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub slug: String,
    /// Year assumed for contract labels that carry no year of their own.
    pub target_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    pub gamma_base_url: String,
    pub news_feed_url: String,
    #[serde(default = "default_headline_limit")]
    pub headline_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub cycle_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub market_ttl_secs: u64,
    pub news_ttl_secs: u64,
}

fn default_headline_limit() -> usize {
    8
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }
}

impl PollingConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn market_ttl(&self) -> Duration {
        Duration::from_secs(self.market_ttl_secs)
    }

    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }
}

/// Environment overrides, mostly useful for pointing the client at a
/// staging endpoint without touching config.toml.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub gamma_base_url: Option<String>,
    pub news_feed_url: Option<String>,
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            gamma_base_url: std::env::var("GAMMA_BASE_URL").ok(),
            news_feed_url: std::env::var("NEWS_FEED_URL").ok(),
        }
    }
}

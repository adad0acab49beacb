mod config;
mod data;
mod model;
mod pipeline;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use config::{Config, EnvConfig};
use data::cache::TtlCache;
use data::gamma_api::GammaApiClient;
use data::news::NewsClient;
use pipeline::{run_cycles, MarketService, NewsService};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Strikewatch feed starting...");

    // Load configuration
    let config = Config::load("config.toml")?;
    let env_config = EnvConfig::load();

    let gamma_base_url = env_config
        .gamma_base_url
        .unwrap_or(config.endpoints.gamma_base_url);
    let news_feed_url = env_config
        .news_feed_url
        .unwrap_or(config.endpoints.news_feed_url);

    tracing::info!("Event slug: {}", config.event.slug);
    tracing::info!("Target year: {}", config.event.target_year);
    tracing::info!("Cycle interval: {}s", config.polling.cycle_interval_secs);

    let markets = MarketService::new(
        GammaApiClient::new(gamma_base_url, config.polling.request_timeout())?,
        Arc::new(TtlCache::new()),
        config.event.slug.clone(),
        config.event.target_year,
        config.polling.market_ttl(),
    );

    let news = NewsService::new(
        NewsClient::new(news_feed_url, config.polling.request_timeout())?,
        Arc::new(TtlCache::new()),
        config.endpoints.headline_limit,
        config.polling.news_ttl(),
    );

    let (update_tx, mut update_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(run_cycles(
        markets,
        news,
        config.polling.cycle_interval(),
        update_tx,
        shutdown_rx,
    ));

    // Consume cycle updates until ctrl-c. This is the render boundary;
    // a UI would subscribe to the same channel.
    loop {
        tokio::select! {
            update = update_rx.recv() => {
                let Some(update) = update else { break };
                let snapshot = &update.snapshot;

                if let Some(error) = &snapshot.meta.error {
                    tracing::error!("Cycle error: {}", error);
                }

                if snapshot.curve.is_empty() {
                    tracing::warn!("No market data this cycle");
                } else {
                    tracing::info!(
                        "{}: {} dates, peak {:.1}%, tier {}, {} dropped, {} headlines",
                        snapshot.meta.title,
                        snapshot.curve.len(),
                        snapshot.curve.peak_cdf_percent(),
                        snapshot.tier,
                        snapshot.meta.dropped_records,
                        update.headlines.len()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    Ok(())
}

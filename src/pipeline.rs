use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::data::cache::TtlCache;
use crate::data::gamma_api::{EventSource, GammaEvent};
use crate::data::news::{HeadlineSource, NewsItem};
use crate::data::normalize::normalize_markets;
use crate::data::types::EventMeta;
use crate::model::curve::{assemble_curve, DistributionCurve};
use crate::model::risk::ThreatTier;

const MARKET_SOURCE: &str = "market";
const NEWS_SOURCE: &str = "news";

/// Everything one cycle hands to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSnapshot {
    pub curve: DistributionCurve,
    pub meta: EventMeta,
    pub tier: ThreatTier,
}

#[derive(Debug, Clone)]
pub struct CycleUpdate {
    pub snapshot: CycleSnapshot,
    pub headlines: Vec<NewsItem>,
}

/// Pure per-cycle derivation: one fetch outcome in, one snapshot out.
///
/// An empty upstream answer gives an empty curve with no error; a failed
/// fetch gives an empty curve plus the error folded into the meta. Either
/// way the cycle completes.
pub fn build_snapshot(
    outcome: Result<Option<GammaEvent>>,
    target_year: i32,
) -> CycleSnapshot {
    let (event, error) = match outcome {
        Ok(event) => (event, None),
        Err(e) => (None, Some(format!("{:#}", e))),
    };

    let Some(event) = event else {
        return CycleSnapshot {
            meta: EventMeta {
                error,
                ..Default::default()
            },
            ..Default::default()
        };
    };

    let (records, dropped) = normalize_markets(&event.markets, target_year);
    let curve = assemble_curve(&records);
    let tier = ThreatTier::classify(&curve);

    let meta = EventMeta {
        title: event.title,
        total_volume: event.volume.unwrap_or(0.0),
        total_liquidity: event.liquidity.unwrap_or(0.0),
        start_date: parse_start_date(event.start_date.as_deref()),
        error: None,
        dropped_records: dropped,
    };

    CycleSnapshot { curve, meta, tier }
}

fn parse_start_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fetch -> normalize -> assemble -> classify, memoized per TTL window.
pub struct MarketService<S: EventSource> {
    source: S,
    cache: Arc<TtlCache<CycleSnapshot>>,
    slug: String,
    target_year: i32,
    ttl: Duration,
}

impl<S: EventSource> MarketService<S> {
    pub fn new(
        source: S,
        cache: Arc<TtlCache<CycleSnapshot>>,
        slug: String,
        target_year: i32,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            slug,
            target_year,
            ttl,
        }
    }

    /// Current snapshot, from cache when fresh. A refreshed value replaces
    /// the cached one whole, captured error included.
    pub async fn snapshot(&self) -> CycleSnapshot {
        if let Some(snapshot) = self.cache.get(MARKET_SOURCE) {
            return snapshot;
        }

        let outcome = self.source.fetch_event(&self.slug).await;
        let snapshot = build_snapshot(outcome, self.target_year);

        if let Some(error) = &snapshot.meta.error {
            warn!("Market fetch failed: {}", error);
        }

        self.cache.insert(MARKET_SOURCE, snapshot.clone(), self.ttl);
        snapshot
    }
}

/// Headline fetch behind its own, much slower TTL.
pub struct NewsService<S: HeadlineSource> {
    source: S,
    cache: Arc<TtlCache<Vec<NewsItem>>>,
    limit: usize,
    ttl: Duration,
}

impl<S: HeadlineSource> NewsService<S> {
    pub fn new(
        source: S,
        cache: Arc<TtlCache<Vec<NewsItem>>>,
        limit: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            limit,
            ttl,
        }
    }

    /// Cached headlines. Failures are not cached, so a broken feed is
    /// retried next cycle instead of pinning an empty batch for a full
    /// TTL window.
    pub async fn headlines(&self) -> Vec<NewsItem> {
        if let Some(items) = self.cache.get(NEWS_SOURCE) {
            return items;
        }

        match self.source.fetch_headlines(self.limit).await {
            Ok(items) => {
                self.cache.insert(NEWS_SOURCE, items.clone(), self.ttl);
                items
            }
            Err(e) => {
                warn!("News fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }
}

/// Drive the poll loop: one market snapshot and one headline batch per
/// tick, delivered over `updates`. Stops between cycles when `shutdown`
/// flips or the consumer hangs up.
pub async fn run_cycles<S, N>(
    markets: MarketService<S>,
    news: NewsService<N>,
    interval: Duration,
    updates: mpsc::Sender<CycleUpdate>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: EventSource,
    N: HeadlineSource,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = markets.snapshot().await;
                let headlines = news.headlines().await;

                if updates.send(CycleUpdate { snapshot, headlines }).await.is_err() {
                    break;
                }
            }
            _ = shutdown.changed() => {
                info!("Cycle loop stopping");
                break;
            }
        }
    }
}

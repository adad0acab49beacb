use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Per-source TTL memo for fetch results.
///
/// Entries hold the value together with its fetch instant and are
/// replaced whole on refresh, never mutated in place. Expiry is an
/// explicit comparison against the TTL supplied at insert, so different
/// sources can refresh on independent clocks.
pub struct TtlCache<T: Clone> {
    cache: DashMap<String, CachedEntry<T>>,
}

struct CachedEntry<T> {
    value: T,
    fetched_at: Instant,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    pub fn insert(&self, key: &str, value: T, ttl: Duration) {
        self.cache.insert(
            key.to_string(),
            CachedEntry {
                value,
                fetched_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Get the cached value if not expired (evict on read)
    pub fn get(&self, key: &str) -> Option<T> {
        self.cache.get(key).and_then(|entry| {
            if entry.fetched_at.elapsed() > entry.ttl {
                drop(entry); // Drop the read lock
                self.cache.remove(key); // Evict stale entry
                None
            } else {
                Some(entry.value.clone())
            }
        })
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

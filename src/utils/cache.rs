use crate::data_structures::{Quote, Ticker};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
struct CacheEntry {
    stored_at: Instant,
    quote: Quote,
}

/// In-memory quote cache keyed by symbol. A zero TTL disables caching.
#[derive(Debug)]
pub struct QuoteCache {
    ttl: Duration,
    entries: Mutex<HashMap<Ticker, CacheEntry>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Check if a cached quote exists and is still valid (within TTL)
    pub async fn get(&self, ticker: &Ticker) -> Option<Quote> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(ticker) else {
            debug!(symbol = %ticker, "Cache miss");
            return None;
        };

        let age = entry.stored_at.elapsed();
        if age < self.ttl {
            debug!(symbol = %ticker, age_secs = age.as_secs(), "Cache hit");
            Some(entry.quote.clone())
        } else {
            debug!(symbol = %ticker, age_secs = age.as_secs(), ttl_secs = self.ttl.as_secs(), "Cache expired");
            entries.remove(ticker);
            None
        }
    }

    pub async fn put(&self, quote: Quote) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.lock().await;
        // Drop anything stale while we hold the lock so the map stays bounded by live tickers.
        entries.retain(|_, e| e.stored_at.elapsed() < self.ttl);
        debug!(symbol = %quote.symbol, "Caching quote");
        entries.insert(quote.symbol.clone(), CacheEntry { stored_at: Instant::now(), quote });
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

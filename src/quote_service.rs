use crate::change::percent_change;
use crate::data_structures::{PriceSeries, Quote, Ticker};
use crate::error::QuoteError;
use crate::utils::QuoteCache;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Anything that can hand back recent daily closes for a ticker.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn daily_history(&self, ticker: &Ticker) -> Result<PriceSeries, QuoteError>;
}

pub struct QuoteService {
    source: Arc<dyn PriceSource>,
    cache: QuoteCache,
}

impl QuoteService {
    pub fn new(source: Arc<dyn PriceSource>, cache_ttl: Duration) -> Self {
        Self { source, cache: QuoteCache::new(cache_ttl) }
    }

    #[instrument(skip(self), fields(symbol = %ticker))]
    pub async fn quote(&self, ticker: &Ticker) -> Result<Quote, QuoteError> {
        if let Some(cached) = self.cache.get(ticker).await {
            debug!("Serving quote from cache");
            return Ok(cached);
        }

        let history = self.source.daily_history(ticker).await.inspect_err(|e| {
            warn!(error = %e, "Price history fetch failed");
        })?;

        let Some(latest) = history.latest().copied() else {
            warn!("Market data service returned an empty series");
            return Err(QuoteError::InvalidTicker(ticker.to_string()));
        };

        let change = percent_change(&history).inspect_err(|e| {
            warn!(points = history.len(), error = %e, "Cannot compute change");
        })?;

        info!(
            points = history.len(),
            price = latest.close,
            change = change.value,
            direction = change.direction.as_str(),
            "Computed quote"
        );

        let quote = Quote { symbol: ticker.clone(), price: latest.close, change, history };
        self.cache.put(quote.clone()).await;
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Direction;
    use crate::data_structures::PricePoint;
    use crate::error::Shortfall;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        closes: Vec<f64>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(closes: &[f64]) -> Arc<Self> {
            Arc::new(Self { closes: closes.to_vec(), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn daily_history(&self, _ticker: &Ticker) -> Result<PriceSeries, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
            Ok(PriceSeries::new(
                self.closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| PricePoint { date: start + chrono::Days::new(i as u64), close })
                    .collect(),
            ))
        }
    }

    struct DownSource;

    #[async_trait]
    impl PriceSource for DownSource {
        async fn daily_history(&self, _ticker: &Ticker) -> Result<PriceSeries, QuoteError> {
            Err(QuoteError::UpstreamUnavailable("request timed out".into()))
        }
    }

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[tokio::test]
    async fn test_quote_from_history() {
        let service = QuoteService::new(StaticSource::new(&[98.0, 100.0, 110.0]), Duration::ZERO);
        let quote = service.quote(&aapl()).await.unwrap();
        assert_eq!(quote.price, 110.0);
        assert!((quote.change.value - 10.0).abs() < 1e-9);
        assert_eq!(quote.change.direction, Direction::Positive);
        assert_eq!(quote.history.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_series_is_invalid_ticker() {
        let service = QuoteService::new(StaticSource::new(&[]), Duration::ZERO);
        let err = service.quote(&aapl()).await.unwrap_err();
        assert!(matches!(err, QuoteError::InvalidTicker(_)));
    }

    #[tokio::test]
    async fn test_single_point_is_insufficient() {
        let service = QuoteService::new(StaticSource::new(&[100.0]), Duration::ZERO);
        let err = service.quote(&aapl()).await.unwrap_err();
        assert!(matches!(err, QuoteError::InsufficientData(Shortfall::TooFewPoints(1))));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let service = QuoteService::new(Arc::new(DownSource), Duration::from_secs(300));
        let err = service.quote(&aapl()).await.unwrap_err();
        assert!(matches!(err, QuoteError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cache_avoids_second_fetch() {
        let source = StaticSource::new(&[100.0, 90.0]);
        let service = QuoteService::new(source.clone(), Duration::from_secs(300));

        service.quote(&aapl()).await.unwrap();
        let again = service.quote(&aapl()).await.unwrap();

        assert_eq!(again.change.direction, Direction::Negative);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let source = StaticSource::new(&[100.0]);
        let service = QuoteService::new(source.clone(), Duration::from_secs(300));

        assert!(service.quote(&aapl()).await.is_err());
        assert!(service.quote(&aapl()).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}

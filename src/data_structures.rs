use crate::change::PercentChange;
use crate::error::QuoteError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_TICKER_LEN: usize = 16;

// --- Ticker ---

/// Normalised ticker symbol: trimmed, upper-cased, restricted charset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, QuoteError> {
        let symbol = raw.trim().to_uppercase();
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=');

        if symbol.is_empty() || symbol.len() > MAX_TICKER_LEN || !symbol.chars().all(valid_char) {
            return Err(QuoteError::InvalidTicker(symbol));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Price history ---

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes for one ticker, oldest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryView {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl From<&PriceSeries> for HistoryView {
    fn from(series: &PriceSeries) -> Self {
        Self {
            dates: series.points().iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect(),
            prices: series.points().iter().map(|p| p.close).collect(),
        }
    }
}

// --- Quote ---

#[derive(Clone, Debug)]
pub struct Quote {
    pub symbol: Ticker,
    pub price: f64,
    pub change: PercentChange,
    pub history: PriceSeries,
}

/// JSON shape returned by `/api/quote/{ticker}`.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub direction: &'static str,
    pub history: HistoryView,
}

impl From<&Quote> for QuoteResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.to_string(),
            price: quote.price,
            change: quote.change.value,
            direction: quote.change.direction.as_str(),
            history: HistoryView::from(&quote.history),
        }
    }
}

// --- Watchlist ---

#[derive(Clone, Debug, Serialize)]
pub struct WatchlistEntry {
    pub ticker: Ticker,
    pub added_on: DateTime<Utc>,
}

/// Most tickers a watchlist holds unless built with another capacity.
pub const WATCHLIST_CAPACITY: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
    Full,
}

#[derive(Debug)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    capacity: usize,
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::with_capacity(WATCHLIST_CAPACITY)
    }
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::new(), capacity }
    }

    pub fn add(&mut self, ticker: Ticker) -> AddOutcome {
        if self.contains(&ticker) {
            return AddOutcome::AlreadyPresent;
        }
        if self.entries.len() >= self.capacity {
            return AddOutcome::Full;
        }
        self.entries.push(WatchlistEntry { ticker, added_on: Utc::now() });
        AddOutcome::Added
    }

    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.ticker != ticker);
        self.entries.len() != before
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.entries.iter().any(|e| &e.ticker == ticker)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<WatchlistEntry> {
        // Entries are appended in insertion order, so reversing keeps ties stable.
        self.entries.iter().rev().cloned().collect()
    }
}

pub type SharedWatchlist = Arc<Mutex<Watchlist>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    #[test]
    fn test_ticker_normalisation() {
        assert_eq!(ticker("  aapl ").as_str(), "AAPL");
        assert_eq!(ticker("brk-b").as_str(), "BRK-B");
        assert_eq!(ticker("^gspc").as_str(), "^GSPC");
        assert_eq!(ticker("eurusd=x").as_str(), "EURUSD=X");
    }

    #[test]
    fn test_ticker_rejects_bad_input() {
        for raw in ["", "   ", "AA PL", "../etc", "A".repeat(17).as_str(), "<script>"] {
            assert!(
                matches!(Ticker::parse(raw), Err(QuoteError::InvalidTicker(_))),
                "expected rejection for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_series_is_sorted_oldest_first() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let series = PriceSeries::new(vec![
            PricePoint { date: d(5), close: 3.0 },
            PricePoint { date: d(1), close: 1.0 },
            PricePoint { date: d(4), close: 2.0 },
        ]);
        let closes: Vec<f64> = series.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.latest().map(|p| p.date), Some(d(5)));
    }

    #[test]
    fn test_history_view_formats_dates() {
        let series = PriceSeries::new(vec![PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: 185.64,
        }]);
        let view = HistoryView::from(&series);
        assert_eq!(view.dates, vec!["2024-01-02".to_string()]);
        assert_eq!(view.prices, vec![185.64]);
    }

    #[test]
    fn test_watchlist_dedup_and_order() {
        let mut list = Watchlist::new();
        assert_eq!(list.add(ticker("AAPL")), AddOutcome::Added);
        assert_eq!(list.add(ticker("MSFT")), AddOutcome::Added);
        assert_eq!(list.add(ticker("aapl")), AddOutcome::AlreadyPresent);

        let symbols: Vec<String> = list.list().into_iter().map(|e| e.ticker.to_string()).collect();
        assert_eq!(symbols, vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn test_watchlist_remove() {
        let mut list = Watchlist::new();
        list.add(ticker("TSLA"));
        assert!(list.remove(&ticker("tsla")));
        assert!(!list.remove(&ticker("TSLA")));
        assert!(list.list().is_empty());
    }

    #[test]
    fn test_watchlist_capacity() {
        let mut list = Watchlist::with_capacity(2);
        assert_eq!(list.add(ticker("AAPL")), AddOutcome::Added);
        assert_eq!(list.add(ticker("MSFT")), AddOutcome::Added);
        assert_eq!(list.add(ticker("TSLA")), AddOutcome::Full);
        // A ticker already on a full list is still reported as present.
        assert_eq!(list.add(ticker("AAPL")), AddOutcome::AlreadyPresent);
        assert!(!list.contains(&ticker("TSLA")));

        assert!(list.remove(&ticker("MSFT")));
        assert_eq!(list.add(ticker("TSLA")), AddOutcome::Added);
        assert_eq!(Watchlist::new().capacity, WATCHLIST_CAPACITY);
    }
}

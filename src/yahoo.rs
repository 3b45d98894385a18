use crate::data_structures::{PricePoint, PriceSeries, Ticker};
use crate::error::QuoteError;
use crate::quote_service::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::seq::IndexedRandom;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

// --- Chart API response ---

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBars>,
}

#[derive(Debug, Deserialize)]
struct QuoteBars {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Daily history from the Yahoo Finance chart endpoint.
pub struct YahooClient {
    client: Client,
    base_url: String,
    range: String,
}

impl YahooClient {
    pub fn new(base_url: &str, range: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            range: range.to_string(),
        })
    }

    fn user_agent(&self) -> &'static str {
        USER_AGENTS.choose(&mut rand::rng()).copied().unwrap_or(USER_AGENTS[0])
    }

    fn chart_url(&self, ticker: &Ticker) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    #[instrument(skip(self), fields(symbol = %ticker, range = %self.range))]
    async fn daily_history(&self, ticker: &Ticker) -> Result<PriceSeries, QuoteError> {
        let response = self
            .client
            .get(self.chart_url(ticker))
            .query(&[("range", self.range.as_str()), ("interval", "1d")])
            .header("Accept", "application/json")
            .header("User-Agent", self.user_agent())
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "Chart response received");

        if status == StatusCode::NOT_FOUND {
            return Err(QuoteError::InvalidTicker(ticker.to_string()));
        }
        if !status.is_success() {
            warn!(%status, "Market data service responded with error");
            return Err(QuoteError::UpstreamUnavailable(format!("upstream status {}", status)));
        }

        let envelope: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| QuoteError::UpstreamUnavailable(format!("malformed chart response: {}", e)))?;

        parse_chart(ticker, envelope)
    }
}

fn parse_chart(ticker: &Ticker, envelope: ChartEnvelope) -> Result<PriceSeries, QuoteError> {
    if let Some(error) = envelope.chart.error {
        if error.code == "Not Found" {
            return Err(QuoteError::InvalidTicker(ticker.to_string()));
        }
        let detail = error.description.unwrap_or_default();
        return Err(QuoteError::UpstreamUnavailable(format!("{}: {}", error.code, detail)));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::default());
    };

    let tz: Tz = result
        .meta
        .as_ref()
        .and_then(|m| m.exchange_timezone_name.as_deref())
        .and_then(|name| name.parse().ok())
        .unwrap_or(chrono_tz::UTC);

    let closes = result.indicators.quote.into_iter().next().map(|q| q.close).unwrap_or_default();
    if closes.len() != result.timestamp.len() {
        warn!(
            timestamps = result.timestamp.len(),
            closes = closes.len(),
            "Chart arrays differ in length, pairing the common prefix"
        );
    }

    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let time = DateTime::<Utc>::from_timestamp(ts, 0)?;
            Some(PricePoint { date: time.with_timezone(&tz).date_naive(), close })
        })
        .collect();

    Ok(PriceSeries::new(points))
}

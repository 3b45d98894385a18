use axum::http::StatusCode;
use thiserror::Error;

/// Why a change could not be computed from an otherwise valid series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    TooFewPoints(usize),
    ZeroPreviousClose,
    NonFinite,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shortfall::TooFewPoints(n) => write!(f, "{} price point(s), need at least 2", n),
            Shortfall::ZeroPreviousClose => write!(f, "previous close is zero"),
            Shortfall::NonFinite => write!(f, "closes do not yield a finite change"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("no market data for ticker '{0}'")]
    InvalidTicker(String),
    #[error("insufficient price history: {0}")]
    InsufficientData(Shortfall),
    #[error("market data service unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl QuoteError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuoteError::InvalidTicker(_) => StatusCode::NOT_FOUND,
            QuoteError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            QuoteError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short message safe to show to the person who asked for the quote.
    pub fn user_message(&self, symbol: &str) -> String {
        match self {
            QuoteError::InvalidTicker(_) => format!("No market data found for {}.", symbol),
            QuoteError::InsufficientData(_) => format!(
                "Not enough recent price history for {} to compute a change.",
                symbol
            ),
            QuoteError::UpstreamUnavailable(_) => {
                "The market data service is unavailable right now. Please try again later."
                    .to_string()
            }
        }
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            QuoteError::UpstreamUnavailable("request timed out".to_string())
        } else {
            QuoteError::UpstreamUnavailable(error.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

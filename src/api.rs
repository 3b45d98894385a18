use crate::data_structures::{AddOutcome, QuoteResponse, SharedWatchlist, Ticker};
use crate::error::QuoteError;
use crate::quote_service::QuoteService;
use crate::render::{render_page, Lookup, Page};
use axum::{
    extract::{Form, Json, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const PAGE_TITLE: &str = "Market Watcher";

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TickerPayload {
    pub ticker: String,
}

/// JSON error body for the `/api` routes.
pub struct ApiError {
    symbol: String,
    error: QuoteError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.error.user_message(&self.symbol) }));
        (self.error.status(), body).into_response()
    }
}

fn parse_ticker(raw: &str) -> Result<Ticker, ApiError> {
    Ticker::parse(raw).map_err(|error| ApiError { symbol: raw.trim().to_uppercase(), error })
}

const WATCHLIST_FULL: &str = "Watchlist is full. Remove a ticker before adding another.";

#[instrument(skip(quotes, watchlist))]
pub async fn dashboard_handler(
    State(quotes): State<Arc<QuoteService>>,
    State(watchlist): State<SharedWatchlist>,
    Query(params): Query<DashboardParams>,
) -> (StatusCode, Html<String>) {
    let raw = params.ticker.as_deref().unwrap_or("").trim();
    let entries = watchlist.lock().await.list();

    if raw.is_empty() {
        debug!("Rendering empty dashboard");
        let page = Page { title: PAGE_TITLE, query: "", lookup: Lookup::None, watchlist: &entries };
        return (StatusCode::OK, Html(render_page(&page)));
    }

    let outcome = match Ticker::parse(raw) {
        Ok(ticker) => quotes.quote(&ticker).await,
        Err(e) => Err(e),
    };

    let symbol = raw.to_uppercase();
    let (status, lookup) = match &outcome {
        Ok(quote) => {
            info!(symbol = %quote.symbol, change = quote.change.value, "Rendering quote");
            (StatusCode::OK, Lookup::Found(quote))
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Quote lookup failed");
            (e.status(), Lookup::Failed { symbol: &symbol, message: e.user_message(&symbol) })
        }
    };

    let page = Page { title: PAGE_TITLE, query: &symbol, lookup, watchlist: &entries };
    (status, Html(render_page(&page)))
}

#[instrument(skip(quotes))]
pub async fn api_quote_handler(
    State(quotes): State<Arc<QuoteService>>,
    Path(ticker): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let ticker = parse_ticker(&ticker)?;
    match quotes.quote(&ticker).await {
        Ok(quote) => Ok(Json(QuoteResponse::from(&quote))),
        Err(error) => {
            warn!(symbol = %ticker, error = %error, "API quote lookup failed");
            Err(ApiError { symbol: ticker.to_string(), error })
        }
    }
}

#[instrument(skip(watchlist))]
pub async fn api_list_watchlist_handler(State(watchlist): State<SharedWatchlist>) -> impl IntoResponse {
    let entries = watchlist.lock().await.list();
    debug!(count = entries.len(), "Returning watchlist");
    Json(entries)
}

#[instrument(skip(watchlist))]
pub async fn api_add_watchlist_handler(
    State(watchlist): State<SharedWatchlist>,
    Json(payload): Json<TickerPayload>,
) -> Result<Response, ApiError> {
    let ticker = parse_ticker(&payload.ticker)?;
    let outcome = watchlist.lock().await.add(ticker.clone());
    info!(symbol = %ticker, ?outcome, "Watchlist add");
    if outcome == AddOutcome::Full {
        let body = Json(json!({ "error": WATCHLIST_FULL }));
        return Ok((StatusCode::CONFLICT, body).into_response());
    }
    Ok(Json(json!({ "status": "success", "ticker": ticker })).into_response())
}

#[instrument(skip(watchlist))]
pub async fn api_remove_watchlist_handler(
    State(watchlist): State<SharedWatchlist>,
    Path(ticker): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticker = parse_ticker(&ticker)?;
    let removed = watchlist.lock().await.remove(&ticker);
    info!(symbol = %ticker, removed, "Watchlist remove");
    Ok(Json(json!({ "status": "deleted" })))
}

#[instrument(skip(watchlist))]
pub async fn add_watchlist_form_handler(
    State(watchlist): State<SharedWatchlist>,
    Form(payload): Form<TickerPayload>,
) -> Response {
    match Ticker::parse(&payload.ticker) {
        Ok(ticker) => match watchlist.lock().await.add(ticker.clone()) {
            AddOutcome::Full => {
                warn!(symbol = %ticker, "Watchlist is full");
                (StatusCode::CONFLICT, WATCHLIST_FULL).into_response()
            }
            _ => Redirect::to(&format!("/?ticker={}", ticker)).into_response(),
        },
        Err(e) => {
            warn!(error = %e, "Rejected watchlist form submission");
            (StatusCode::BAD_REQUEST, "Invalid ticker").into_response()
        }
    }
}

#[instrument(skip(watchlist))]
pub async fn remove_watchlist_form_handler(
    State(watchlist): State<SharedWatchlist>,
    Path(ticker): Path<String>,
) -> Redirect {
    if let Ok(ticker) = Ticker::parse(&ticker) {
        watchlist.lock().await.remove(&ticker);
    }
    Redirect::to("/")
}

pub async fn health_handler() -> &'static str {
    "OK"
}

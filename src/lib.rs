pub mod api;
pub mod change;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod quote_service;
pub mod render;
pub mod utils;
pub mod yahoo;

use crate::config::RateLimitConfig;
use crate::data_structures::SharedWatchlist;
use crate::error::ConfigError;
use crate::quote_service::QuoteService;
use axum::{
    extract::FromRef,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<QuoteService>,
    pub watchlist: SharedWatchlist,
}

impl FromRef<AppState> for Arc<QuoteService> {
    fn from_ref(app_state: &AppState) -> Arc<QuoteService> {
        app_state.quotes.clone()
    }
}

impl FromRef<AppState> for SharedWatchlist {
    fn from_ref(app_state: &AppState) -> SharedWatchlist {
        app_state.watchlist.clone()
    }
}

/// Dashboard pages plus the JSON API. Rate limiting is layered on by the binary.
pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/quote/{ticker}", get(api::api_quote_handler))
        .route(
            "/watchlist",
            get(api::api_list_watchlist_handler).post(api::api_add_watchlist_handler),
        )
        .route("/watchlist/{ticker}", delete(api::api_remove_watchlist_handler))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(api::dashboard_handler))
        .route("/watchlist", post(api::add_watchlist_form_handler))
        .route("/watchlist/{ticker}/delete", post(api::remove_watchlist_form_handler))
        .route("/health", get(api::health_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Per-IP limiting keyed on the peer address, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn with_rate_limit(router: Router, limits: &RateLimitConfig) -> Result<Router, ConfigError> {
    // The governor takes the interval between replenished tokens, not a rate.
    let replenish_ms = 1000 / limits.per_second.clamp(1, 1000);
    let governor_conf = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(limits.burst_size)
        .finish()
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "rate_limit",
            value: format!("{}/s burst {}", limits.per_second, limits.burst_size),
        })?;

    Ok(router.layer(GovernorLayer::new(Arc::new(governor_conf))))
}

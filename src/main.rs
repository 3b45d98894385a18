use anyhow::Context;
use market_watcher::{
    app,
    config::AppConfig,
    data_structures::{SharedWatchlist, Watchlist},
    quote_service::QuoteService,
    utils::init_logger,
    with_rate_limit,
    yahoo::YahooClient,
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load().context("loading configuration")?;
    init_logger()?;

    // Set a global span with the app name for all subsequent logs
    let _span = tracing::info_span!("app", name = %app_config.app_name).entered();

    tracing::info!("Starting market-watcher");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        upstream = %app_config.market_data_url,
        range = %app_config.history_range,
        cache_ttl_secs = app_config.cache_ttl.as_secs(),
        "Loaded configuration"
    );

    let source = YahooClient::new(
        &app_config.market_data_url,
        &app_config.history_range,
        app_config.upstream_timeout,
    )?;
    let quotes = Arc::new(QuoteService::new(Arc::new(source), app_config.cache_ttl));
    let watchlist: SharedWatchlist = Arc::new(Mutex::new(Watchlist::new()));

    let router = with_rate_limit(app(AppState { quotes, watchlist }), &app_config.rate_limit)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// src/main.rs
// Process entry point: tracing init, metrics exporter, axum server bootstrap.
// Grounded in the teacher's `main.rs` startup sequence (subscriber init ->
// startup log -> build long-lived server -> serve), adapted from the
// teacher's stdio MCP transport to an axum TCP listener, and from its
// `FmtSubscriber::builder()` to an `EnvFilter`-driven `tracing_subscriber::fmt`
// init since this service's log level is configurable via `SEARCH_LOG_LEVEL`.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use headhunter_search::config::CONFIG;
use headhunter_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&CONFIG.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).init();

    info!("starting headhunter-search");

    PrometheusBuilder::new()
        .install()
        .expect("prometheus exporter installs");

    let state = Arc::new(AppState::new(&CONFIG).await?);
    info!("application state initialized");

    let app = headhunter_search::api::http::router(state);

    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

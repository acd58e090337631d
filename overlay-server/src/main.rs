//! # Overlay Canvas Server
//!
//! Serves the real-time canvas channel plus health, state and metrics
//! endpoints.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use overlay_server::metrics;
use overlay_server::{router, AppState, CliArgs, ServerConfig};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,overlay_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,overlay_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from(CliArgs::parse());

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let addr = config.socket_addr();
    let ws_path = config.ws_path.clone();
    let mode = config.mode;
    let state = AppState::new(config);
    let app = router(state, Some(metrics_handle));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(mode = mode.as_str(), "Overlay canvas server starting on http://{}", addr);
    tracing::info!("Real-time channel at ws://{}{}", addr, ws_path);

    axum::serve(listener, app).await?;

    Ok(())
}

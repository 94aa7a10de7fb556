// TTC ETA API server
// Proxies the NextBus XML prediction feed and serves it as JSON

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use ttc_eta_api::config::Cli;
use ttc_eta_api::{AppState, EtaServer, NextBusClient};

// ============================================================================
// Logging
// ============================================================================

/// Colored stderr output, plus daily rolling JSON files when `log_dir` is set.
/// The returned guard must be kept alive for the file writer to flush.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let (json_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ttc_eta_api.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking)
                .with_filter(
                    EnvFilter::builder()
                        .with_env_var("RUST_LOG_JSON")
                        .with_default_directive(LevelFilter::DEBUG.into())
                        .from_env_lossy(),
                );
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    let feed_config = cli.feed_config();
    info!(
        feed_url = %feed_config.base_url,
        agency = %feed_config.agency,
        timeout_secs = feed_config.timeout.as_secs(),
        "feed configured"
    );

    let client = NextBusClient::new(feed_config.clone()).context("Failed to build feed client")?;

    let state = AppState {
        feed: Arc::new(client),
        agency: feed_config.agency,
        timezone: feed_config.timezone,
        sweep: cli.sweep_config(),
    };

    EtaServer::new(state)
        .run(&cli.host, cli.port)
        .await
        .with_context(|| format!("Server on {}:{} failed", cli.host, cli.port))
}

//! Murmur REST API entry point.
//!
//! Binary name: `murmur`
//!
//! Parses CLI arguments, initializes the database and services, then
//! starts the REST API server.

mod http;
mod state;

use std::path::PathBuf;

use clap::Parser;

use murmur_infra::config::default_data_dir;
use murmur_observe::tracing_setup::init_tracing;
use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "murmur", version, about = "Local-first chat and image generation service")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 3900, env = "MURMUR_PORT")]
    port: u16,

    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1", env = "MURMUR_HOST")]
    host: String,

    /// Data directory (database, config, images).
    #[arg(long, env = "MURMUR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Emit OpenTelemetry spans to stdout.
    #[arg(long)]
    otel: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _tracing = init_tracing(cli.otel).map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let state = AppState::init(data_dir).await?;

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "murmur API listening");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Tubeflow Control Plane Server

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tubeflow_control_plane::{http, AppState, Config, SimulatedExecutor};

/// Tubeflow automation control plane.
#[derive(Parser, Debug)]
#[command(name = "tubeflow-control-plane", about = "Tubeflow automation control plane")]
struct Args {
    /// HTTP server address
    #[arg(long, default_value = "[::1]:8080")]
    http_addr: String,

    /// Maximum number of activity log entries retained
    #[arg(long, default_value = "1000")]
    log_capacity: usize,

    /// Events a live subscriber may lag behind before skipping
    #[arg(long, default_value = "256")]
    stream_buffer: usize,

    /// Duration of each simulated task run in milliseconds
    #[arg(long, default_value = "3000")]
    simulated_delay_ms: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            http_bind_addr: args.http_addr,
            log_capacity: args.log_capacity,
            stream_buffer: args.stream_buffer,
            simulated_delay_ms: args.simulated_delay_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tubeflow=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    // Load config
    let config: Config = Args::parse().into();
    config.validate()?;
    let http_addr: SocketAddr = config.http_bind_addr.parse()?;

    // Create shared state
    let executor = Arc::new(SimulatedExecutor::new(config.simulated_delay()));
    let state = AppState::new(&config, executor)?;

    info!(
        http_addr = %http_addr,
        tasks = state.registry.len().await,
        log_capacity = config.log_capacity,
        "Starting Tubeflow control plane"
    );

    // Start HTTP server
    let router = http::create_router(state.clone());
    let listener = TcpListener::bind(http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = state.runner.cancel_all().await;
    if cancelled > 0 {
        warn!(cancelled, "Cancelled in-flight runs on shutdown");
    }
    info!("Tubeflow control plane stopped");

    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! HTTP to message-bus API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                      GATEWAY                          │
//!                      │                                                       │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌────────────┐       │
//!   ───────────────────┼─▶│  http   │───▶│ routing  │───▶│   proxy    │       │
//!                      │  │ server  │    │  table   │    │ dispatcher │       │
//!                      │  └────┬────┘    └──────────┘    └─────┬──────┘       │
//!                      │       │                               │              │
//!                      │       │                               ▼              │
//!   Client Response    │       │                         ┌────────────┐       │   Backend
//!   ◀──────────────────┼───────┘◀────────────────────────│    bus     │◀──────┼── services
//!                      │       │                         │ req/reply  │       │
//!                      │       ▼  (fire-and-forget)      └────────────┘       │
//!                      │  ┌─────────┐                                         │
//!                      │  │  stats  │──▶ GET /.stats                          │
//!                      │  │ window  │                                         │
//!                      │  └─────────┘                                         │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use bus_gateway::config::{load_config, GatewayConfig};
use bus_gateway::lifecycle::{self, signals, Shutdown};
use bus_gateway::observability::{self, metrics};
use bus_gateway::GatewayError;

#[derive(Parser)]
#[command(name = "bus-gateway")]
#[command(about = "HTTP API gateway dispatching requests over a message bus", long_about = None)]
struct Args {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Attach echo/status responders for every route on the in-process bus.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    observability::init_logging(&config.observability);
    tracing::info!("bus-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        listen = %config.server.listen,
        handlers = config.handlers.len(),
        bus_timeout_ms = config.bus.request_timeout_ms,
        stats_window_secs = config.stats.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: AddrParseError| GatewayError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(GatewayError::Metrics)?;
    }

    let gateway = lifecycle::start(config, args.demo).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    gateway.server.run(gateway.listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

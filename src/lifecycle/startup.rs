//! Startup orchestration.
//!
//! Config first, then core (route table, bus, stats), then the listener.
//! Any startup error is fatal: the gateway never serves with a partial
//! route table.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::bus::echo::attach_demo_services;
use crate::bus::LocalBus;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::HttpServer;
use crate::routing::RouteTable;

/// A gateway ready to accept traffic.
pub struct Gateway {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub bus: Arc<LocalBus>,
}

/// Build every subsystem and bind the listener.
///
/// With `demo` set, echo and status responders are attached to the
/// in-process bus for every configured route.
pub async fn start(config: GatewayConfig, demo: bool) -> Result<Gateway, GatewayError> {
    let bus = Arc::new(LocalBus::new(config.bus.request_timeout()));
    tracing::info!(request_timeout = ?bus.timeout(), "In-process bus ready");

    if demo {
        let routes = RouteTable::from_config(&config.handlers)?;
        attach_demo_services(&bus, &routes);
    }

    let listen = config.server.listen.clone();
    let server = HttpServer::new(config, bus.clone())?;

    let listener = TcpListener::bind(&listen).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    Ok(Gateway {
        server,
        listener,
        bus,
    })
}

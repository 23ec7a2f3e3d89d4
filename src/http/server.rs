//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, request logging)
//! - Bind server to listener
//! - Resolve requests against the route table
//! - Dispatch matched requests over the message bus
//! - Feed completed requests to the stats recorder

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::bus::MessageBus;
use crate::config::GatewayConfig;
use crate::http::logging::log_requests;
use crate::http::request::{extract_inbound, MakeHexRequestId};
use crate::http::response::{service_response, MatchedRoute};
use crate::observability::metrics;
use crate::proxy::Dispatcher;
use crate::routing::{RouteError, RouteTable};
use crate::stats::{StatsAggregator, StatsRecorder};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub dispatcher: Dispatcher,
    pub stats: StatsRecorder,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    stats_task: JoinHandle<()>,
}

impl HttpServer {
    /// Build the server. Fails if any route pattern does not compile.
    ///
    /// Must be called from within a Tokio runtime (spawns the stats task).
    pub fn new(config: GatewayConfig, bus: Arc<dyn MessageBus>) -> Result<Self, RouteError> {
        let routes = Arc::new(RouteTable::from_config(&config.handlers)?);

        let aggregator = Arc::new(StatsAggregator::new(config.stats.window()));
        let (stats, stats_task) = StatsRecorder::spawn(aggregator, config.stats.queue_capacity);

        let state = AppState {
            routes,
            dispatcher: Dispatcher::new(bus),
            stats,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            stats_task,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A request that outlives `server.timeout_secs` is answered with 504, like
    /// a bus timeout, and counts as a server-side failure.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .merge(admin::routes())
            .fallback(proxy_handler)
            .with_state(state.clone())
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                config.server.timeout(),
            ))
            .layer(middleware::from_fn_with_state(state, log_requests))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeHexRequestId))
    }

    /// The fully layered router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        // Let queued samples land before the aggregation task goes away.
        self.state.stats.flush().await;
        self.stats_task.abort();

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Resolves the route, dispatches over the bus and translates the reply.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let inbound = match extract_inbound(request).await {
        Ok(inbound) => inbound,
        Err(response) => return response,
    };

    let Some(route) = state.routes.resolve(&inbound.host, &inbound.path) else {
        tracing::warn!(
            request_id = %inbound.request_id,
            host = %inbound.host,
            path = %inbound.path,
            "No route matched"
        );
        return StatusCode::NOT_FOUND.into_response();
    };

    tracing::debug!(
        request_id = %inbound.request_id,
        route = route.name(),
        "Route matched"
    );

    let mut response = match state.dispatcher.dispatch(route, &inbound).await {
        Ok(reply) => service_response(reply),
        Err(e) => {
            tracing::error!(
                request_id = %inbound.request_id,
                route = route.name(),
                subject = route.external_subject(),
                error = %e,
                "Dispatch failed"
            );
            metrics::record_dispatch_error(e.kind());
            e.into_response()
        }
    };

    response
        .extensions_mut()
        .insert(MatchedRoute(route.name().to_string()));
    response
}

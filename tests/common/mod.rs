//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use bytes::Bytes;
use serde_json::{json, Value};

use bus_gateway::bus::echo::{spawn_echo_service, spawn_status_service};
use bus_gateway::bus::{LocalBus, ServiceResponse};
use bus_gateway::config::{GatewayConfig, HandlerConfig};
use bus_gateway::HttpServer;

/// Config with two routes: `users` on any host, `orders` on `api.example.com` only.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.listen = "127.0.0.1:0".to_string();
    config.bus.request_timeout_ms = 200;
    config.handlers = vec![
        HandlerConfig::new("users", "svc.users")
            .with_regex("", "^/users(/.*)?$")
            .with_internal_subject("svc.users.status"),
        HandlerConfig::new("orders", "svc.orders")
            .with_regex("^api\\.example\\.com$", "^/orders")
            .with_internal_subject("svc.orders.status"),
    ];
    config
}

/// A bus with echo and status responders on the `users` subjects only.
pub fn echo_bus(config: &GatewayConfig) -> Arc<LocalBus> {
    let bus = Arc::new(LocalBus::new(config.bus.request_timeout()));
    spawn_echo_service(&bus, "svc.users");
    spawn_status_service(&bus, "svc.users.status", "users");
    bus
}

/// Serve `subject` with a responder that sleeps before replying.
pub fn spawn_slow_service(bus: &LocalBus, subject: &str, delay: Duration) {
    bus.serve(subject.to_string(), move |_payload: Bytes| async move {
        tokio::time::sleep(delay).await;
        encode(&ServiceResponse::new(200, json!("late")))
    });
}

/// Serve `subject` with a fixed reply.
pub fn spawn_fixed_service(bus: &LocalBus, subject: &str, reply: ServiceResponse) {
    let payload = encode(&reply);
    bus.serve(subject.to_string(), move |_payload: Bytes| {
        let payload = payload.clone();
        async move { payload }
    });
}

pub fn encode(reply: &ServiceResponse) -> Bytes {
    Bytes::from(serde_json::to_vec(reply).unwrap())
}

pub fn server(config: GatewayConfig, bus: Arc<LocalBus>) -> HttpServer {
    HttpServer::new(config, bus).unwrap()
}

pub fn get(host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

use axum::{extract::State, Json};
use bytes::Bytes;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::bus::{MessageBus, ServiceResponse, StatusProbe};
use crate::http::server::AppState;
use crate::routing::RouteRule;
use crate::stats::StatsSnapshot;

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub version: String,
    pub status: String,
    pub routes: usize,
    pub services: Vec<ServiceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub subject: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.aggregator().snapshot())
}

pub async fn get_status(State(state): State<AppState>) -> Json<GatewayStatus> {
    let bus = state.dispatcher.bus();
    let probes = state
        .routes
        .rules()
        .iter()
        .filter(|rule| !rule.internal_subject().is_empty())
        .map(|rule| probe_service(bus.as_ref(), rule));

    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        routes: state.routes.len(),
        services: join_all(probes).await,
    })
}

/// Ask a service for its status on its internal subject.
pub async fn probe_service(bus: &dyn MessageBus, rule: &RouteRule) -> ServiceStatus {
    let subject = rule.internal_subject();
    let payload = serde_json::to_vec(&StatusProbe::default()).unwrap_or_default();

    let error = match bus.request(subject, Bytes::from(payload)).await {
        Ok(reply) => match serde_json::from_slice::<ServiceResponse>(&reply) {
            Ok(reply) if (200..300).contains(&reply.status) => None,
            Ok(reply) => Some(format!("service reported status {}", reply.status)),
            Err(e) => Some(format!("malformed status reply: {}", e)),
        },
        Err(e) => Some(e.to_string()),
    };

    if let Some(reason) = &error {
        tracing::warn!(route = rule.name(), subject, error = %reason, "Status probe failed");
    }

    ServiceStatus {
        name: rule.name().to_string(),
        subject: subject.to_string(),
        healthy: error.is_none(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::bus::LocalBus;
    use crate::config::HandlerConfig;

    fn rule() -> RouteRule {
        RouteRule::from_config(
            &HandlerConfig::new("users", "svc.users").with_internal_subject("svc.users.status"),
        )
        .unwrap()
    }

    fn reply(status: u16) -> Bytes {
        Bytes::from(serde_json::to_vec(&ServiceResponse::new(status, json!({}))).unwrap())
    }

    #[tokio::test]
    async fn test_probe_healthy_service() {
        let bus = LocalBus::new(Duration::from_secs(1));
        bus.serve("svc.users.status", |payload: Bytes| async move {
            let probe: StatusProbe = serde_json::from_slice(&payload).unwrap();
            assert_eq!(probe.action, "status");
            reply(200)
        });

        let status = probe_service(&bus, &rule()).await;
        assert!(status.healthy);
        assert_eq!(status.subject, "svc.users.status");
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_reports_failures() {
        let bus = LocalBus::new(Duration::from_secs(1));
        let status = probe_service(&bus, &rule()).await;
        assert!(!status.healthy);
        assert!(status.error.unwrap().contains("no responders"));

        bus.serve("svc.users.status", |_payload: Bytes| async move { reply(503) });
        let status = probe_service(&bus, &rule()).await;
        assert!(!status.healthy);
        assert_eq!(status.error.as_deref(), Some("service reported status 503"));
    }
}

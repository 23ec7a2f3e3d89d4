//! Demo responders for the in-process bus.
//!
//! Used by the binary's `--demo` mode and by tests: the echo service answers
//! every dispatch with the request it saw, the status service answers probes.

use bytes::Bytes;
use serde_json::json;

use crate::bus::local::LocalBus;
use crate::bus::message::{DispatchMessage, ServiceResponse};
use crate::routing::RouteTable;

/// Build the echo reply for a raw dispatch payload.
pub fn echo_reply(payload: &[u8]) -> ServiceResponse {
    match serde_json::from_slice::<DispatchMessage>(payload) {
        Ok(request) => ServiceResponse::new(
            200,
            json!({
                "service": request.service,
                "method": request.method,
                "path": request.path,
                "query": request.query,
                "body": request.body,
                "body_encoding": request.body_encoding,
                "request_id": request.request_id,
                "authenticated": request.raw_auth.is_some(),
            }),
        ),
        Err(e) => ServiceResponse::new(400, json!({ "error": e.to_string() })),
    }
}

fn encode(reply: &ServiceResponse) -> Bytes {
    serde_json::to_vec(reply).map(Bytes::from).unwrap_or_default()
}

/// Answer dispatches on `subject` with an echo of the request.
pub fn spawn_echo_service(bus: &LocalBus, subject: &str) {
    bus.serve(subject.to_string(), |payload: Bytes| async move {
        encode(&echo_reply(&payload))
    });
}

/// Answer status probes on `subject`.
pub fn spawn_status_service(bus: &LocalBus, subject: &str, name: &str) {
    let name = name.to_string();
    bus.serve(subject.to_string(), move |_payload: Bytes| {
        let body = json!({ "service": name, "status": "ok" });
        async move { encode(&ServiceResponse::new(200, body)) }
    });
}

/// Attach demo responders for every route in the table.
pub fn attach_demo_services(bus: &LocalBus, routes: &RouteTable) {
    for rule in routes.rules() {
        spawn_echo_service(bus, rule.external_subject());
        if !rule.internal_subject().is_empty() {
            spawn_status_service(bus, rule.internal_subject(), rule.name());
        }
        tracing::info!(
            route = rule.name(),
            subject = rule.external_subject(),
            "Demo responder attached"
        );
    }
}

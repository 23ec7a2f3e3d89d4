//! Request logging middleware.
//!
//! Logs every request on the way in and on the way out, then hands the
//! completion to the stats recorder without waiting on it. Administrative
//! paths (`/.` prefix) are logged but never counted.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{client_ip, request_id};
use crate::http::response::MatchedRoute;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::stats::Completion;

/// White-listed headers included in the incoming request log line.
pub const LOGGED_HEADERS: &[&str] = &[
    "accept",
    "accept-encoding",
    "accept-language",
    "cache-control",
    "content-length",
    "content-type",
    "forwarded",
    "host",
    "origin",
    "referer",
    "user-agent",
    "via",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
];

pub fn is_admin_path(path: &str) -> bool {
    path.starts_with("/.")
}

fn logged_headers(request: &Request<Body>) -> Vec<(&'static str, String)> {
    LOGGED_HEADERS
        .iter()
        .filter_map(|name| {
            request
                .headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v.to_string()))
        })
        .collect()
}

pub async fn log_requests(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request_id(request.headers());
    let remote_address = client_ip(&request);
    let method = request.method().clone();
    let url = request.uri().clone();

    tracing::info!(
        request_id = %request_id,
        remote_address = %remote_address,
        method = %method,
        url = %url,
        headers = ?logged_headers(&request),
        "Incoming request"
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        remote_address = %remote_address,
        method = %method,
        url = %url,
        status_code = status.as_u16(),
        duration = ?elapsed,
        "Outgoing response"
    );

    if !is_admin_path(url.path()) {
        let route = response
            .extensions()
            .get::<MatchedRoute>()
            .map(|r| r.0.as_str())
            .unwrap_or("none");
        metrics::record_request(route, status.as_u16(), elapsed);

        let latency_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        state.stats.record(Completion::new(latency_ns, status.as_u16()));
    }

    response
}

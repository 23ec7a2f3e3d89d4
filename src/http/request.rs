//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (32 hex chars)
//! - Extract routing-relevant information (host, path)
//! - Convert the HTTP request into an `InboundRequest` for dispatch
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing; caller-supplied IDs are kept
//! - Client IP prefers proxy headers over the socket peer
//! - Non-JSON text bodies are forwarded as JSON strings, binary bodies as base64

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, Query};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::bus::{BodyEncoding, MultiMap};
use crate::proxy::InboundRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates request IDs as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeHexRequestId;

impl MakeRequestId for MakeHexRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Pre-verified authentication result attached by an upstream auth layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAuth(pub Value);

pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Host as sent by the client, port included.
pub fn request_host<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

pub fn client_ip<B>(request: &Request<B>) -> String {
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default()
}

fn query_params(uri: &Uri) -> MultiMap {
    let mut query = MultiMap::new();
    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(uri) {
        for (key, value) in pairs {
            query.entry(key).or_default().push(value);
        }
    }
    query
}

fn header_map(headers: &HeaderMap) -> MultiMap {
    let mut map = MultiMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Body as carried in the bus envelope. Bytes are never altered: anything
/// that is neither JSON nor UTF-8 text travels as base64.
fn body_value(bytes: &[u8]) -> (Value, Option<BodyEncoding>) {
    if bytes.is_empty() {
        return (Value::Null, None);
    }
    if let Ok(value) = serde_json::from_slice(bytes) {
        return (value, None);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => (Value::String(text.to_string()), None),
        Err(_) => (
            Value::String(STANDARD.encode(bytes)),
            Some(BodyEncoding::Base64),
        ),
    }
}

/// Convert an HTTP request into the gateway's inbound request.
///
/// Fails with a ready-made 413 response when the body exceeds the limit.
pub async fn extract_inbound(request: Request<Body>) -> Result<InboundRequest, Response> {
    let host = request_host(&request);
    let client_ip = client_ip(&request);
    let raw_auth = request.extensions().get::<RawAuth>().map(|a| a.0.clone());

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read request body");
        StatusCode::PAYLOAD_TOO_LARGE.into_response()
    })?;
    let (body, body_encoding) = body_value(&bytes);

    Ok(InboundRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        host,
        query: query_params(&parts.uri),
        headers: header_map(&parts.headers),
        body,
        body_encoding,
        client_ip,
        request_id: request_id(&parts.headers),
        raw_auth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_is_hex() {
        let request = Request::builder().body(()).unwrap();
        let id = MakeHexRequestId.make_request_id(&request).unwrap();
        let id = id.header_value().to_str().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_client_ip_precedence() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.9");

        let request = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request), "198.51.100.2");

        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 5555))));
        assert_eq!(client_ip(&request), "192.0.2.4");
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let request = Request::builder()
            .uri("http://api.example.com:8443/x")
            .body(())
            .unwrap();
        assert_eq!(request_host(&request), "api.example.com:8443");
    }

    #[test]
    fn test_body_value() {
        assert_eq!(body_value(b""), (Value::Null, None));
        assert_eq!(body_value(br#"{"a":1}"#), (json!({"a": 1}), None));
        assert_eq!(body_value(b"plain text"), (json!("plain text"), None));
    }

    #[test]
    fn test_binary_body_is_not_altered() {
        let raw = [0xff, 0x00, 0x80, 0x41];
        let (body, encoding) = body_value(&raw);
        assert_eq!(encoding, Some(BodyEncoding::Base64));
        assert_eq!(body, json!("/wCAQQ=="));
        assert_eq!(STANDARD.decode(body.as_str().unwrap()).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_extract_inbound() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/orders/9?expand=items&expand=payments&dry_run=1")
            .header("host", "shop.example.com")
            .header(X_REQUEST_ID, "abc")
            .header("x-custom", "one")
            .header("x-custom", "two")
            .body(Body::from(r#"{"qty": 3}"#))
            .unwrap();
        request.extensions_mut().insert(RawAuth(json!({"uid": 1})));

        let inbound = extract_inbound(request).await.unwrap();
        assert_eq!(inbound.method, "POST");
        assert_eq!(inbound.path, "/orders/9");
        assert_eq!(inbound.host, "shop.example.com");
        assert_eq!(inbound.request_id, "abc");
        assert_eq!(inbound.query["expand"], vec!["items", "payments"]);
        assert_eq!(inbound.query["dry_run"], vec!["1"]);
        assert_eq!(inbound.headers["x-custom"], vec!["one", "two"]);
        assert_eq!(inbound.body, json!({"qty": 3}));
        assert_eq!(inbound.body_encoding, None);
        assert_eq!(inbound.raw_auth, Some(json!({"uid": 1})));
    }
}

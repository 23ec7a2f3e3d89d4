//! Response handling and transformation.
//!
//! # Responsibilities
//! - Translate a backend's bus reply into an HTTP response
//! - Map dispatch failures to deterministic error statuses
//!
//! # Design Decisions
//! - Hop-by-hop and framing headers from the reply are dropped
//! - String bodies pass through verbatim; other JSON is re-serialized
//! - Dispatch timeouts result in 504, every other dispatch failure in 502

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::bus::ServiceResponse;
use crate::proxy::DispatchError;

/// Name of the route that produced a response, for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

fn is_skipped(name: &HeaderName) -> bool {
    *name == header::CONNECTION
        || *name == header::CONTENT_LENGTH
        || *name == header::TRANSFER_ENCODING
        || *name == header::UPGRADE
}

pub fn service_response(reply: ServiceResponse) -> Response {
    let status = match StatusCode::from_u16(reply.status) {
        Ok(status) => status,
        Err(_) => {
            tracing::warn!(status = reply.status, "Backend replied with invalid status");
            return DispatchError::MalformedReply(format!("invalid status code {}", reply.status))
                .into_response();
        }
    };

    let mut builder = Response::builder().status(status);
    let mut has_content_type = false;
    if let Some(headers) = builder.headers_mut() {
        for (name, values) in &reply.header {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                tracing::debug!(header = %name, "Dropping invalid reply header");
                continue;
            };
            if is_skipped(&name) {
                continue;
            }
            has_content_type |= name == header::CONTENT_TYPE;
            for value in values {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(name.clone(), value);
                }
            }
        }
    }

    let body = match reply.body {
        Value::Null => Body::empty(),
        Value::String(text) => Body::from(text),
        other => {
            if !has_content_type {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
            }
            Body::from(serde_json::to_vec(&other).unwrap_or_default())
        }
    };

    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::to_bytes;

    use crate::bus::{BusError, MultiMap};

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_gets_content_type() {
        let response = service_response(ServiceResponse::new(201, json!({"id": 7})));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_string(response).await, r#"{"id":7}"#);
    }

    #[tokio::test]
    async fn test_string_body_and_headers_pass_through() {
        let reply = ServiceResponse {
            status: 200,
            header: MultiMap::from([
                ("content-type".to_string(), vec!["text/csv".to_string()]),
                ("set-cookie".to_string(), vec!["a=1".to_string(), "b=2".to_string()]),
                ("content-length".to_string(), vec!["999".to_string()]),
                ("bad header".to_string(), vec!["x".to_string()]),
            ]),
            body: json!("a,b\n1,2\n"),
        };
        let response = service_response(reply);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(body_string(response).await, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_null_body_is_empty() {
        let response = service_response(ServiceResponse::new(204, Value::Null));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_errors_map_to_gateway_statuses() {
        let timeout = DispatchError::Bus(BusError::Timeout {
            subject: "svc.a".into(),
            after: Duration::from_secs(5),
        });
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let missing = DispatchError::Bus(BusError::NoResponders {
            subject: "svc.a".into(),
        });
        let response = missing.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "no responders on subject 'svc.a'");
    }
}

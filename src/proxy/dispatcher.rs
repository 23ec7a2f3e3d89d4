//! Request dispatch over the message bus.
//!
//! # Responsibilities
//! - Build the bus message for a resolved route
//! - Perform the request/reply call
//! - Decode the backend's reply or report a distinguishable failure
//!
//! # Design Decisions
//! - No retries, circuit breaking or load balancing at this layer
//! - Timeouts belong to the bus client; every failure maps to 502 or 504
//! - `internal_subject` is never used here

use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use thiserror::Error;

use crate::bus::{BusError, DispatchMessage, MessageBus, ServiceResponse};
use crate::proxy::inbound::InboundRequest;
use crate::routing::RouteRule;

/// Why a dispatch produced no usable reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to encode bus request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("malformed reply from backend: {0}")]
    MalformedReply(String),
}

impl DispatchError {
    /// HTTP status the caller must answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Bus(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Encode(_) => "encode",
            DispatchError::Bus(e) => e.kind(),
            DispatchError::MalformedReply(_) => "malformed_reply",
        }
    }
}

/// Translates inbound requests into bus requests.
#[derive(Clone)]
pub struct Dispatcher {
    bus: Arc<dyn MessageBus>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.bus
    }

    /// Build the outbound message for `route`.
    pub fn build_message(route: &RouteRule, request: &InboundRequest) -> DispatchMessage {
        DispatchMessage {
            service: route.external_subject().to_string(),
            request_id: request.request_id.clone(),
            request_ip: request.client_ip.clone(),
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            body_encoding: request.body_encoding,
            header: request.headers.clone(),
            raw_auth: request.raw_auth.clone(),
        }
    }

    /// Dispatch `request` to the backend behind `route` and await its reply.
    pub async fn dispatch(
        &self,
        route: &RouteRule,
        request: &InboundRequest,
    ) -> Result<ServiceResponse, DispatchError> {
        let message = Self::build_message(route, request);
        let payload = serde_json::to_vec(&message).map_err(DispatchError::Encode)?;

        tracing::debug!(
            request_id = %request.request_id,
            route = route.name(),
            subject = route.external_subject(),
            "Dispatching request via bus"
        );

        let reply = self
            .bus
            .request(route.external_subject(), Bytes::from(payload))
            .await?;

        let response = decode_reply(&reply)?;

        tracing::debug!(
            request_id = %request.request_id,
            route = route.name(),
            status = response.status,
            "Received reply from service"
        );
        Ok(response)
    }
}

fn decode_reply(reply: &[u8]) -> Result<ServiceResponse, DispatchError> {
    let response: ServiceResponse = serde_json::from_slice(reply)
        .map_err(|e| DispatchError::MalformedReply(e.to_string()))?;

    if StatusCode::from_u16(response.status).is_err() {
        return Err(DispatchError::MalformedReply(format!(
            "invalid status code {}",
            response.status
        )));
    }
    Ok(response)
}

//! The gateway's view of an inbound HTTP request.

use serde_json::Value;

use crate::bus::{BodyEncoding, MultiMap};

/// Everything the dispatcher needs from an HTTP request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub host: String,
    pub query: MultiMap,
    pub headers: MultiMap,
    pub body: Value,
    /// Set when `body` carries an encoding of a binary payload.
    pub body_encoding: Option<BodyEncoding>,
    pub client_ip: String,
    pub request_id: String,
    /// Pre-verified authentication payload, when an auth layer produced one.
    pub raw_auth: Option<Value>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}

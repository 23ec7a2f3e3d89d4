//! Bus envelope types.
//!
//! Requests and replies travel as JSON. Field names are part of the wire
//! contract with backend services and must not change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Multi-valued string mapping used for query parameters and headers.
pub type MultiMap = HashMap<String, Vec<String>>;

/// A request dispatched to a backend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMessage {
    /// Destination subject.
    pub service: String,

    #[serde(rename = "requestID")]
    pub request_id: String,

    #[serde(rename = "requestIP")]
    pub request_ip: String,

    pub method: String,
    pub path: String,

    #[serde(default)]
    pub query: MultiMap,

    #[serde(default)]
    pub body: Value,

    /// Set when `body` is not the payload itself but an encoding of it.
    #[serde(rename = "bodyEncoding", default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<BodyEncoding>,

    #[serde(default)]
    pub header: MultiMap,

    /// Pre-verified authentication result, forwarded untouched.
    #[serde(rename = "rawAuth", default, skip_serializing_if = "Option::is_none")]
    pub raw_auth: Option<Value>,
}

/// How a request body that is not UTF-8 text travels inside the JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// `body` is a JSON string holding the standard base64 of the raw bytes.
    Base64,
}

/// A backend service's reply.
///
/// Missing fields default to an empty `200 OK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub header: MultiMap,

    #[serde(default)]
    pub body: Value,
}

fn default_status() -> u16 {
    200
}

impl ServiceResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            header: MultiMap::new(),
            body,
        }
    }
}

/// Payload sent to a service's internal subject to ask for its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusProbe {
    pub action: String,
}

impl Default for StatusProbe {
    fn default() -> Self {
        Self {
            action: "status".to_string(),
        }
    }
}

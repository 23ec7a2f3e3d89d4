//! Message bus subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → message.rs (DispatchMessage, JSON encoded)
//!     → MessageBus::request(subject, payload)   [timeout owned by the bus]
//!     → backend service on `subject`
//!     → reply payload (ServiceResponse, JSON encoded)
//! ```
//!
//! # Design Decisions
//! - The transport is a seam: anything offering "send request, await reply"
//!   can implement `MessageBus`
//! - The bus owns the request timeout; callers never wait unbounded
//! - `local.rs` is an in-process implementation for embedded services and tests

pub mod echo;
pub mod local;
pub mod message;

use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;

pub use local::{Envelope, LocalBus};
pub use message::{BodyEncoding, DispatchMessage, MultiMap, ServiceResponse, StatusProbe};

/// Failure of a request/reply exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("no responders on subject '{subject}'")]
    NoResponders { subject: String },

    #[error("request to '{subject}' timed out after {after:?}")]
    Timeout { subject: String, after: Duration },

    #[error("responder on '{subject}' dropped the request without replying")]
    Closed { subject: String },

    #[error("bus transport error: {0}")]
    Transport(String),
}

impl BusError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BusError::Timeout { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BusError::NoResponders { .. } => "no_responders",
            BusError::Timeout { .. } => "timeout",
            BusError::Closed { .. } => "closed",
            BusError::Transport(_) => "transport",
        }
    }
}

/// Synchronous request/reply primitive of the message bus.
///
/// Implementations must resolve every call within their configured timeout.
pub trait MessageBus: Send + Sync + 'static {
    fn request<'a>(
        &'a self,
        subject: &'a str,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<Bytes, BusError>>;
}

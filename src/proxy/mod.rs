//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest + resolved RouteRule
//!     → dispatcher.rs (build DispatchMessage, encode)
//!     → MessageBus::request(external_subject)
//!     → ServiceResponse | DispatchError (502 / 504)
//! ```

pub mod dispatcher;
pub mod inbound;

pub use dispatcher::{DispatchError, Dispatcher};
pub use inbound::InboundRequest;

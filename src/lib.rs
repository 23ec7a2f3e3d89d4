//! HTTP to message-bus API gateway library.
//!
//! Requests are matched against an ordered table of host/path regex rules;
//! the first matching rule names the bus subject the request is dispatched
//! to. Completed requests feed a sliding-window statistics engine exposed on
//! `/.stats`.

pub mod admin;
pub mod bus;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod stats;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

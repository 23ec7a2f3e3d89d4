//! Top-level error type for gateway startup.
//!
//! Only startup can fail the process. Per-request failures are turned into
//! HTTP responses by the proxy handler and never reach this type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Route(#[from] RouteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics exporter error: {0}")]
    Metrics(String),
}

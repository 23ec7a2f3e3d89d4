//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings (bind address, limits).
    pub server: ServerConfig,

    /// Message bus client settings.
    pub bus: BusConfig,

    /// Sliding-window statistics settings.
    pub stats: StatsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Handler definitions mapping requests to bus subjects.
    /// Declaration order is match order.
    pub handlers: Vec<HandlerConfig>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub listen: String,

    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            timeout_secs: 15,
            max_body_bytes: 1 << 20,
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Message bus client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Request/reply timeout in milliseconds. Enforced by the bus client,
    /// not by the dispatcher.
    pub request_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
        }
    }
}

impl BusConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Statistics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Sliding window duration in seconds.
    pub window_secs: u64,

    /// Capacity of the recorder queue feeding the aggregation task.
    pub queue_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_secs: 10,
            queue_capacity: 4096,
        }
    }
}

impl StatsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A handler routes matching requests to a backend service on the bus.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandlerConfig {
    /// Handler identifier for logging/metrics.
    pub name: String,

    /// Ordered `[host, path]` regex pairs. An empty side matches anything.
    #[serde(default)]
    pub request_regexes: Vec<[String; 2]>,

    /// Bus subject requests are dispatched to.
    pub external_subject: String,

    /// Bus subject answering out-of-band status probes.
    #[serde(default)]
    pub internal_subject: String,
}

impl HandlerConfig {
    pub fn new(name: impl Into<String>, external_subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_regexes: Vec::new(),
            external_subject: external_subject.into(),
            internal_subject: String::new(),
        }
    }

    /// Append a `[host, path]` pattern pair.
    pub fn with_regex(mut self, host: impl Into<String>, path: impl Into<String>) -> Self {
        self.request_regexes.push([host.into(), path.into()]);
        self
    }

    pub fn with_internal_subject(mut self, subject: impl Into<String>) -> Self {
        self.internal_subject = subject.into();
        self
    }
}

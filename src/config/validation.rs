//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check handler definitions (names, subjects, patterns)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::matcher::Pattern;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.listen '{0}' is not a socket address")]
    InvalidListenAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("bus.request_timeout_ms ({bus_ms}ms) must be shorter than server.timeout_secs ({server_secs}s)")]
    BusTimeoutNotShorter { bus_ms: u64, server_secs: u64 },

    #[error("handler #{0} has an empty name")]
    EmptyHandlerName(usize),

    #[error("handler '{0}' is declared more than once")]
    DuplicateHandler(String),

    #[error("handler '{0}' has an empty external_subject")]
    EmptySubject(String),

    #[error("handler '{handler}' pattern #{index} ({side}): {reason}")]
    InvalidPattern {
        handler: String,
        index: usize,
        side: &'static str,
        reason: String,
    },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.listen.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidListenAddress(
            config.server.listen.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.server.timeout_secs == 0 {
        errors.push(ValidationError::Zero("server.timeout_secs"));
    }
    if config.bus.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero("bus.request_timeout_ms"));
    }
    // A dispatch must fail on its own before the request deadline cuts it off.
    if config.bus.request_timeout_ms > 0
        && config.server.timeout_secs > 0
        && config.bus.request_timeout() >= config.server.timeout()
    {
        errors.push(ValidationError::BusTimeoutNotShorter {
            bus_ms: config.bus.request_timeout_ms,
            server_secs: config.server.timeout_secs,
        });
    }
    if config.stats.window_secs == 0 {
        errors.push(ValidationError::Zero("stats.window_secs"));
    }
    if config.stats.queue_capacity == 0 {
        errors.push(ValidationError::Zero("stats.queue_capacity"));
    }

    let mut seen = HashSet::new();
    for (position, handler) in config.handlers.iter().enumerate() {
        if handler.name.is_empty() {
            errors.push(ValidationError::EmptyHandlerName(position));
        } else if !seen.insert(handler.name.as_str()) {
            errors.push(ValidationError::DuplicateHandler(handler.name.clone()));
        }

        if handler.external_subject.is_empty() {
            errors.push(ValidationError::EmptySubject(handler.name.clone()));
        }

        for (index, [host, path]) in handler.request_regexes.iter().enumerate() {
            for (side, raw) in [("host", host), ("path", path)] {
                if let Err(e) = Pattern::compile(raw) {
                    errors.push(ValidationError::InvalidPattern {
                        handler: handler.name.clone(),
                        index,
                        side,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

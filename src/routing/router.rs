//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled route rules in declaration order
//! - Look up the matching rule for a request
//! - Return the matched rule or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First declared match wins; no "best match" scoring
//! - Any invalid pattern fails the whole build

use thiserror::Error;

use crate::config::HandlerConfig;
use crate::routing::matcher::{Matcher, Pattern, RequestTarget, RoutePattern};

/// Error raised while compiling the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route '{route}' pattern #{index} has invalid {side} regex: {source}")]
    InvalidPattern {
        route: String,
        index: usize,
        side: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// A named rule mapping request patterns to a bus subject.
#[derive(Debug, Clone)]
pub struct RouteRule {
    name: String,
    patterns: Vec<RoutePattern>,
    external_subject: String,
    internal_subject: String,
}

impl RouteRule {
    pub fn new(
        name: impl Into<String>,
        patterns: Vec<RoutePattern>,
        external_subject: impl Into<String>,
        internal_subject: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            patterns,
            external_subject: external_subject.into(),
            internal_subject: internal_subject.into(),
        }
    }

    /// Compile a rule from its handler configuration.
    pub fn from_config(config: &HandlerConfig) -> Result<Self, RouteError> {
        let mut patterns = Vec::with_capacity(config.request_regexes.len());
        for (index, [host, path]) in config.request_regexes.iter().enumerate() {
            let compile = |side: &'static str, raw: &str| {
                Pattern::compile(raw).map_err(|source| RouteError::InvalidPattern {
                    route: config.name.clone(),
                    index,
                    side,
                    source,
                })
            };
            patterns.push(RoutePattern::new(compile("host", host)?, compile("path", path)?));
        }

        Ok(Self::new(
            config.name.clone(),
            patterns,
            config.external_subject.clone(),
            config.internal_subject.clone(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    /// Bus subject used for dispatch.
    pub fn external_subject(&self) -> &str {
        &self.external_subject
    }

    /// Bus subject used for status probes. Empty when the service has none.
    pub fn internal_subject(&self) -> &str {
        &self.internal_subject
    }
}

impl Matcher for RouteRule {
    // Any pattern pair is sufficient (OR).
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.patterns.iter().any(|p| p.matches(target))
    }
}

/// Ordered, immutable collection of route rules.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Compile every handler, in declaration order.
    pub fn from_config(handlers: &[HandlerConfig]) -> Result<Self, RouteError> {
        let rules = handlers
            .iter()
            .map(RouteRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &rules {
            let patterns: Vec<String> = rule
                .patterns()
                .iter()
                .map(|p| format!("[{:?}, {:?}]", p.host().as_str(), p.path().as_str()))
                .collect();
            tracing::debug!(
                route = rule.name(),
                subject = rule.external_subject(),
                patterns = ?patterns,
                "Route compiled"
            );
        }
        tracing::debug!(routes = rules.len(), "Route table compiled");
        Ok(Self { rules })
    }

    /// Resolve a request to the first rule that matches it.
    pub fn resolve(&self, host: &str, path: &str) -> Option<&RouteRule> {
        let target = RequestTarget::new(host, path);
        self.rules.iter().find(|rule| rule.matches(&target))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> RouteTable {
        RouteTable::from_config(&[
            HandlerConfig::new("svc-a", "svc.a").with_regex("", "/a/.*"),
            HandlerConfig::new("svc-b", "svc.b").with_regex("host\\.com", ""),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_by_path() {
        let table = example_table();
        let rule = table.resolve("anything", "/a/1").unwrap();
        assert_eq!(rule.name(), "svc-a");
        assert_eq!(rule.external_subject(), "svc.a");
    }

    #[test]
    fn test_resolve_by_host() {
        let table = example_table();
        assert_eq!(table.resolve("host.com", "/x").unwrap().name(), "svc-b");
    }

    #[test]
    fn test_no_match() {
        let table = example_table();
        assert!(table.resolve("other.com", "/y").is_none());
        assert!(RouteTable::default().resolve("host.com", "/a/1").is_none());
    }

    #[test]
    fn test_first_declared_rule_wins() {
        let table = example_table();
        // Both rules match; svc-a is declared first.
        assert_eq!(table.resolve("host.com", "/a/1").unwrap().name(), "svc-a");

        let table = RouteTable::from_config(&[
            HandlerConfig::new("catch-all", "svc.all").with_regex("", ""),
            HandlerConfig::new("specific", "svc.specific").with_regex("", "^/exact$"),
        ])
        .unwrap();
        assert_eq!(table.resolve("h", "/exact").unwrap().name(), "catch-all");
    }

    #[test]
    fn test_any_pattern_in_rule_matches() {
        let table = RouteTable::from_config(&[HandlerConfig::new("multi", "svc.multi")
            .with_regex("", "^/one")
            .with_regex("", "^/two")
            .with_regex("^three\\.", "")])
        .unwrap();

        assert!(table.resolve("x", "/one/1").is_some());
        assert!(table.resolve("x", "/two").is_some());
        assert!(table.resolve("three.example", "/zzz").is_some());
        assert!(table.resolve("x", "/four").is_none());
    }

    #[test]
    fn test_rule_without_patterns_never_matches() {
        let table = RouteTable::from_config(&[
            HandlerConfig::new("empty", "svc.empty"),
            HandlerConfig::new("fallback", "svc.fallback").with_regex("", ""),
        ])
        .unwrap();
        assert_eq!(table.resolve("x", "/").unwrap().name(), "fallback");
    }

    #[test]
    fn test_rule_keeps_declared_patterns() {
        let table = RouteTable::from_config(&[HandlerConfig::new("multi", "svc.multi")
            .with_regex("", "^/one")
            .with_regex("^api\\.", "")])
        .unwrap();

        let patterns = table.rules()[0].patterns();
        assert_eq!(patterns.len(), 2);
        assert!(patterns[0].host().is_wildcard());
        assert_eq!(patterns[0].path().as_str(), "^/one");
        assert_eq!(patterns[1].host().as_str(), "^api\\.");
        assert_eq!(patterns[1].path().as_str(), "");
    }

    #[test]
    fn test_invalid_pattern_fails_build() {
        let err = RouteTable::from_config(&[
            HandlerConfig::new("ok", "svc.ok").with_regex("", "^/ok"),
            HandlerConfig::new("bad", "svc.bad")
                .with_regex("", "^/fine")
                .with_regex("", "(oops"),
        ])
        .unwrap_err();

        match err {
            RouteError::InvalidPattern { route, index, side, .. } => {
                assert_eq!(route, "bad");
                assert_eq!(index, 1);
                assert_eq!(side, "path");
            }
        }
    }

    #[test]
    fn test_concurrent_resolution() {
        let table = std::sync::Arc::new(example_table());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || {
                    let path = format!("/a/{}", i);
                    table.resolve("anything", &path).map(|r| r.name().to_string())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("svc-a"));
        }
    }
}

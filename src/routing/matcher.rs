//! Route matching logic.
//!
//! # Responsibilities
//! - Compile raw regex strings into reusable patterns
//! - Match host and path with AND semantics within one pattern pair
//!
//! # Design Decisions
//! - Empty pattern string = wildcard, always matches
//! - Regexes are unanchored (search semantics); anchor in config when needed
//! - Host is matched against the raw Host header, port included

use regex::Regex;

/// The host and path of an inbound request, as seen by the matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub host: &'a str,
    pub path: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn new(host: &'a str, path: &'a str) -> Self {
        Self { host, path }
    }
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RequestTarget<'_>) -> bool;
}

/// A compiled regex, or a wildcard when built from an empty string.
#[derive(Debug, Clone, Default)]
pub struct Pattern(Option<Regex>);

impl Pattern {
    /// Compile a raw pattern. An empty string yields the wildcard.
    pub fn compile(raw: &str) -> Result<Self, regex::Error> {
        if raw.is_empty() {
            return Ok(Self::any());
        }
        Regex::new(raw).map(|re| Self(Some(re)))
    }

    pub fn any() -> Self {
        Self(None)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref().map(Regex::as_str).unwrap_or("")
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.0 {
            Some(re) => re.is_match(text),
            None => true,
        }
    }
}

/// A host pattern and a path pattern that must both match.
#[derive(Debug, Clone, Default)]
pub struct RoutePattern {
    host: Pattern,
    path: Pattern,
}

impl RoutePattern {
    pub fn new(host: Pattern, path: Pattern) -> Self {
        Self { host, path }
    }

    pub fn host(&self) -> &Pattern {
        &self.host
    }

    pub fn path(&self) -> &Pattern {
        &self.path
    }
}

impl Matcher for RoutePattern {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.host.is_match(target.host) && self.path.is_match(target.path)
    }
}

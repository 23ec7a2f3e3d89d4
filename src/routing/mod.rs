//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (evaluate host/path patterns)
//!     → Return: matched RouteRule or NoMatch
//!
//! Route Compilation (at startup):
//!     HandlerConfig[]
//!     → Compile regex pairs (empty = wildcard)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use matcher::{Matcher, Pattern, RequestTarget, RoutePattern};
pub use router::{RouteError, RouteRule, RouteTable};

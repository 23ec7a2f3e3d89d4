//! Sliding-window request statistics.
//!
//! # Data Flow
//! ```text
//! Completed request (latency, status)
//!     → recorder.rs (bounded queue, fire-and-forget)
//!     → aggregation task
//!     → aggregator.rs (window + lifetime counters, one lock)
//!     → window.rs (append, prune at most once per second)
//!
//! Query:
//!     GET /.stats → StatsAggregator::snapshot()
//! ```
//!
//! # Design Decisions
//! - Explicit aggregator instance, no process-wide singleton
//! - Window bounded by time, not by sample count
//! - Lifetime counters are never pruned

pub mod aggregator;
pub mod recorder;
pub mod window;

pub use aggregator::{StatsAggregator, StatsSnapshot};
pub use recorder::{Completion, StatsRecorder};
pub use window::{Sample, TimeWindow};

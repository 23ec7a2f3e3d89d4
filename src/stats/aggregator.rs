//! Request statistics: a latency window plus lifetime counters.
//!
//! All state sits behind one mutex per aggregator. Recording never fails
//! visibly; a poisoned lock is recovered rather than propagated.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::stats::window::TimeWindow;

/// Point-in-time view of the gateway's request statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Requests per second over the window.
    pub rps: f64,
    /// Requests since process start.
    pub count: u64,
    /// 4xx responses since process start.
    #[serde(rename = "count_400")]
    pub count_4xx: u64,
    /// 5xx responses since process start.
    #[serde(rename = "count_500")]
    pub count_5xx: u64,
    /// 95th percentile latency over the window, in nanoseconds.
    #[serde(rename = "response_time_95")]
    pub p95: u64,
    #[serde(rename = "response_time_avg")]
    pub avg: f64,
    #[serde(rename = "response_time_min")]
    pub min: u64,
    #[serde(rename = "response_time_max")]
    pub max: u64,
}

#[derive(Debug)]
struct StatsInner {
    window: TimeWindow,
    count: u64,
    count_4xx: u64,
    count_5xx: u64,
}

#[derive(Debug)]
pub struct StatsAggregator {
    inner: Mutex<StatsInner>,
}

impl StatsAggregator {
    pub fn new(window: Duration) -> Self {
        Self::with_window(TimeWindow::new(window))
    }

    pub fn with_window(window: TimeWindow) -> Self {
        Self {
            inner: Mutex::new(StatsInner {
                window,
                count: 0,
                count_4xx: 0,
                count_5xx: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one completed request.
    pub fn record(&self, latency: u64, is_4xx: bool, is_5xx: bool) {
        self.record_at(latency, is_4xx, is_5xx, Instant::now());
    }

    pub fn record_at(&self, latency: u64, is_4xx: bool, is_5xx: bool, now: Instant) {
        let mut inner = self.lock();
        inner.window.append_at(latency, now);
        inner.count += 1;
        if is_4xx {
            inner.count_4xx += 1;
        }
        if is_5xx {
            inner.count_5xx += 1;
        }
        inner.window.prune_at(now);
    }

    /// Drop expired samples (at most one scan per second).
    pub fn prune(&self) -> bool {
        self.lock().window.prune()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> StatsSnapshot {
        let mut inner = self.lock();
        inner.window.prune_at(now);

        let window = &inner.window;
        StatsSnapshot {
            rps: window.count_per_second(),
            count: inner.count,
            count_4xx: inner.count_4xx,
            count_5xx: inner.count_5xx,
            p95: window.percentile(0.95),
            avg: window.avg(),
            min: window.min(),
            max: window.max(),
        }
    }

    /// Samples currently retained in the window.
    pub fn retained(&self) -> usize {
        self.lock().window.len()
    }
}

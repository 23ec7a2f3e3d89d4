//! Time-bounded series of integer samples.
//!
//! # Numeric Contract
//! - `percentile(p)`: sort ascending, index = floor(p * (n - 1) + 0.5)
//! - `avg`, `min`, `max`, `percentile` return 0 on an empty window
//! - `count_per_second`: retained samples / window seconds, 0 for a zero window
//!
//! # Pruning
//! Samples are appended in time order, so expired samples are always at the
//! front. `prune_at` drops every sample with `timestamp <= now - duration`, and
//! runs its scan at most once per whole second elapsed since the window's origin.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub value: u64,
    pub timestamp: Instant,
}

/// Sliding window of samples bounded by a fixed duration.
#[derive(Debug)]
pub struct TimeWindow {
    duration: Duration,
    origin: Instant,
    last_prune: Option<u64>,
    samples: VecDeque<Sample>,
}

impl TimeWindow {
    pub fn new(duration: Duration) -> Self {
        Self::with_origin(duration, Instant::now())
    }

    /// Create a window whose prune gate counts seconds from `origin`.
    pub fn with_origin(duration: Duration, origin: Instant) -> Self {
        Self {
            duration,
            origin,
            last_prune: None,
            samples: VecDeque::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn append(&mut self, value: u64) {
        self.append_at(value, Instant::now());
    }

    pub fn append_at(&mut self, value: u64, timestamp: Instant) {
        // Keep the deque ordered even if a caller hands us a stale instant.
        let timestamp = match self.samples.back() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };
        self.samples.push_back(Sample { value, timestamp });
    }

    /// Drop expired samples. Returns true if the scan ran.
    pub fn prune(&mut self) -> bool {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&mut self, now: Instant) -> bool {
        let second = now.saturating_duration_since(self.origin).as_secs();
        if self.last_prune == Some(second) {
            return false;
        }
        self.last_prune = Some(second);

        let Some(cutoff) = now.checked_sub(self.duration) else {
            return true;
        };
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.timestamp <= cutoff)
        {
            self.samples.pop_front();
        }
        true
    }

    pub fn percentile(&self, p: f64) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }

        let mut values: Vec<u64> = self.samples.iter().map(|s| s.value).collect();
        values.sort_unstable();

        let p = p.clamp(0.0, 1.0);
        let idx = (p * (values.len() - 1) as f64 + 0.5).floor() as usize;
        values[idx.min(values.len() - 1)]
    }

    pub fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value as f64).sum();
        sum / self.samples.len() as f64
    }

    pub fn min(&self) -> u64 {
        self.samples.iter().map(|s| s.value).min().unwrap_or(0)
    }

    pub fn max(&self) -> u64 {
        self.samples.iter().map(|s| s.value).max().unwrap_or(0)
    }

    pub fn count_per_second(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.samples.len() as f64 / self.duration.as_secs_f64()
    }
}

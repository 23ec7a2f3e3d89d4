//! Fire-and-forget recording front end for the aggregator.
//!
//! Request handlers push completions into a bounded queue drained by a single
//! aggregation task, so the response path never waits on the stats lock.
//! When the queue is full (or the task is gone) the sample is applied
//! directly: recording is at-least-once and never blocks on capacity.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::stats::aggregator::StatsAggregator;

/// One completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub latency_ns: u64,
    pub status: u16,
    /// When the response was produced; the sample is windowed by this instant.
    pub completed_at: Instant,
}

impl Completion {
    pub fn new(latency_ns: u64, status: u16) -> Self {
        Self::at(latency_ns, status, Instant::now())
    }

    pub fn at(latency_ns: u64, status: u16, completed_at: Instant) -> Self {
        Self {
            latency_ns,
            status,
            completed_at,
        }
    }

    pub fn is_4xx(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_5xx(&self) -> bool {
        self.status >= 500
    }
}

#[derive(Debug)]
enum Command {
    Record(Completion),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle used by request handlers.
#[derive(Debug, Clone)]
pub struct StatsRecorder {
    tx: mpsc::Sender<Command>,
    aggregator: Arc<StatsAggregator>,
}

impl StatsRecorder {
    /// Spawn the aggregation task. It exits once every handle is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(aggregator: Arc<StatsAggregator>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(aggregator.clone(), rx));
        (Self { tx, aggregator }, task)
    }

    pub fn aggregator(&self) -> &Arc<StatsAggregator> {
        &self.aggregator
    }

    /// Queue a completion. Never blocks.
    pub fn record(&self, completion: Completion) {
        if let Err(e) = self.tx.try_send(Command::Record(completion)) {
            let reason = match &e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "aggregator stopped",
            };
            tracing::trace!(reason, "Recording stats sample inline");
            self.apply(completion);
        }
    }

    /// Wait until every completion queued before this call is applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    fn apply(&self, completion: Completion) {
        apply(&self.aggregator, completion);
    }
}

fn apply(aggregator: &StatsAggregator, c: Completion) {
    aggregator.record_at(c.latency_ns, c.is_4xx(), c.is_5xx(), c.completed_at);
}

async fn run(aggregator: Arc<StatsAggregator>, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Record(completion) => apply(&aggregator, completion),
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Stats aggregation task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::stats::window::TimeWindow;

    #[test]
    fn test_status_classes() {
        assert!(Completion::new(1, 404).is_4xx());
        assert!(!Completion::new(1, 404).is_5xx());
        assert!(Completion::new(1, 502).is_5xx());
        assert!(!Completion::new(1, 200).is_4xx());
        assert!(!Completion::new(1, 399).is_4xx());
    }

    #[tokio::test]
    async fn test_recorded_samples_reach_aggregator() {
        let aggregator = Arc::new(StatsAggregator::new(Duration::from_secs(10)));
        let (recorder, _task) = StatsRecorder::spawn(aggregator.clone(), 16);

        recorder.record(Completion::new(10, 200));
        recorder.record(Completion::new(20, 404));
        recorder.record(Completion::new(30, 503));
        recorder.flush().await;

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.count_4xx, 1);
        assert_eq!(snapshot.count_5xx, 1);
        assert_eq!(snapshot.p95, 30);
    }

    #[tokio::test]
    async fn test_full_queue_records_inline() {
        let aggregator = Arc::new(StatsAggregator::new(Duration::from_secs(10)));
        let (tx, _rx) = mpsc::channel(1);
        // No consumer: the first sample fills the queue, the rest go inline.
        let recorder = StatsRecorder {
            tx,
            aggregator: aggregator.clone(),
        };
        for i in 0..5 {
            recorder.record(Completion::new(i, 200));
        }
        assert_eq!(aggregator.snapshot().count, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_record_from_tasks() {
        let aggregator = Arc::new(StatsAggregator::new(Duration::from_secs(60)));
        let (recorder, _task) = StatsRecorder::spawn(aggregator.clone(), 8);

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let recorder = recorder.clone();
                tokio::spawn(async move { recorder.record(Completion::new(i, 200)) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        recorder.flush().await;

        assert_eq!(aggregator.snapshot().count, 200);
        assert_eq!(aggregator.retained(), 200);
    }

    #[tokio::test]
    async fn test_samples_keep_their_completion_time() {
        let origin = Instant::now();
        let aggregator = Arc::new(StatsAggregator::with_window(TimeWindow::with_origin(
            Duration::from_secs(10),
            origin,
        )));
        let (recorder, _task) = StatsRecorder::spawn(aggregator.clone(), 4);

        let completed_at = origin + Duration::from_secs(100);
        recorder.record(Completion::at(25, 200, completed_at));
        recorder.flush().await;

        // Stamped at apply time the sample would already be outside the window.
        let snapshot = aggregator.snapshot_at(completed_at + Duration::from_secs(5));
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.max, 25);
        assert_eq!(aggregator.retained(), 1);

        let snapshot = aggregator.snapshot_at(completed_at + Duration::from_secs(11));
        assert_eq!(snapshot.max, 0);
    }

    #[tokio::test]
    async fn test_task_stops_when_handles_drop() {
        let aggregator = Arc::new(StatsAggregator::new(Duration::from_secs(10)));
        let (recorder, task) = StatsRecorder::spawn(aggregator, 4);
        drop(recorder);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}

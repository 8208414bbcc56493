//! Thread-safe counters for sync runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::observer::{RunOutcome, SyncObserver};

/// Details about the most recently finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LastRun {
    outcome: RunOutcome,
    duration: Duration,
    finished_at_ms: u64,
}

/// Lock-free counters for sync runs plus per-topic publish counts.
///
/// Share it behind an `Arc`: the pipeline records into it through
/// [`SyncObserver`] while the metrics endpoint reads snapshots.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    runs_started: AtomicU64,
    runs_succeeded: AtomicU64,
    runs_failed: AtomicU64,
    published: RwLock<BTreeMap<String, Arc<AtomicU64>>>,
    last_run: RwLock<Option<LastRun>>,
}

impl SyncMetrics {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn topic_counter(&self, topic: &str) -> Arc<AtomicU64> {
        // Fast path: check if it exists
        {
            let published = self.published.read();
            if let Some(counter) = published.get(topic) {
                return counter.clone();
            }
        }

        // Slow path: create it
        let mut published = self.published.write();
        published
            .entry(topic.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    /// Collect the current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let messages_published = self
            .published
            .read()
            .iter()
            .map(|(topic, counter)| (topic.clone(), counter.load(Ordering::Relaxed)))
            .collect();

        let last_run = *self.last_run.read();

        MetricsSnapshot {
            timestamp_ms: now_ms(),
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_succeeded: self.runs_succeeded.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            messages_published,
            last_run_succeeded: last_run.map(|r| r.outcome == RunOutcome::Succeeded),
            last_run_duration: last_run.map(|r| r.duration),
            last_run_finished_ms: last_run.map(|r| r.finished_at_ms),
        }
    }
}

impl SyncObserver for SyncMetrics {
    fn run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    fn run_finished(&self, outcome: RunOutcome, elapsed: Duration) {
        match outcome {
            RunOutcome::Succeeded => self.runs_succeeded.fetch_add(1, Ordering::Relaxed),
            RunOutcome::Failed => self.runs_failed.fetch_add(1, Ordering::Relaxed),
        };
        *self.last_run.write() = Some(LastRun {
            outcome,
            duration: elapsed,
            finished_at_ms: now_ms(),
        });
    }

    fn message_published(&self, topic: &str, _key: &str) {
        self.topic_counter(topic).fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`SyncMetrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// Unix timestamp in milliseconds when the snapshot was taken.
    pub timestamp_ms: u64,
    pub runs_started: u64,
    pub runs_succeeded: u64,
    pub runs_failed: u64,
    /// Acknowledged messages, keyed by topic.
    pub messages_published: BTreeMap<String, u64>,
    pub last_run_succeeded: Option<bool>,
    pub last_run_duration: Option<Duration>,
    /// Unix timestamp in milliseconds when the last run finished.
    pub last_run_finished_ms: Option<u64>,
}

impl MetricsSnapshot {
    /// Runs started but not yet finished.
    pub fn runs_in_flight(&self) -> u64 {
        self.runs_started
            .saturating_sub(self.runs_succeeded + self.runs_failed)
    }

    /// Total messages published across all topics.
    pub fn total_published(&self) -> u64 {
        self.messages_published.values().sum()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let metrics = SyncMetrics::new();
        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.runs_started, 0);
        assert!(snapshot.messages_published.is_empty());
        assert_eq!(snapshot.last_run_succeeded, None);
        assert_eq!(snapshot.last_run_duration, None);
    }

    #[test]
    fn test_run_lifecycle() {
        let metrics = SyncMetrics::new();

        metrics.run_started();
        assert_eq!(metrics.snapshot().runs_in_flight(), 1);

        metrics.run_finished(RunOutcome::Succeeded, Duration::from_millis(250));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs_in_flight(), 0);
        assert_eq!(snapshot.runs_succeeded, 1);
        assert_eq!(snapshot.last_run_succeeded, Some(true));
        assert_eq!(snapshot.last_run_duration, Some(Duration::from_millis(250)));
        assert!(snapshot.last_run_finished_ms.is_some());
    }

    #[test]
    fn failed_run_overwrites_last_run() {
        let metrics = SyncMetrics::new();

        metrics.run_started();
        metrics.run_finished(RunOutcome::Succeeded, Duration::from_secs(1));
        metrics.run_started();
        metrics.run_finished(RunOutcome::Failed, Duration::from_secs(2));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs_succeeded, 1);
        assert_eq!(snapshot.runs_failed, 1);
        assert_eq!(snapshot.last_run_succeeded, Some(false));
        assert_eq!(snapshot.last_run_duration, Some(Duration::from_secs(2)));
    }

    #[test]
    fn messages_counted_per_topic() {
        let metrics = SyncMetrics::new();

        metrics.message_published("versions", "Kubernetes-v1");
        metrics.message_published("versions", "Kubernetes-v2");
        metrics.message_published("other", "Kubernetes-v1");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_published["versions"], 2);
        assert_eq!(snapshot.messages_published["other"], 1);
        assert_eq!(snapshot.total_published(), 3);
    }

    #[test]
    fn records_through_shared_handle() {
        let metrics = Arc::new(SyncMetrics::new());
        let observer: Arc<dyn SyncObserver> = metrics.clone();

        observer.run_started();
        observer.message_published("versions", "Kubernetes-v1");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs_started, 1);
        assert_eq!(snapshot.total_published(), 1);
    }

    #[test]
    fn concurrent_recording() {
        let metrics = Arc::new(SyncMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.message_published("versions", "k");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().messages_published["versions"], 1000);
    }
}

//! Observer hooks invoked by the sync pipeline.

use std::sync::Arc;
use std::time::Duration;

/// How a sync run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fetch and publish both completed, or the run was stopped.
    Succeeded,
    /// Either phase returned an error.
    Failed,
}

/// Receives telemetry from the sync pipeline at well-defined points.
///
/// All methods have empty default implementations so observers only
/// override what they care about. Implementations must be cheap and must
/// not block: they are called inline on the pipeline's tasks.
pub trait SyncObserver: Send + Sync {
    /// A sync run is about to start fetching.
    fn run_started(&self) {}

    /// A sync run finished.
    fn run_finished(&self, _outcome: RunOutcome, _elapsed: Duration) {}

    /// The broker acknowledged a message.
    fn message_published(&self, _topic: &str, _key: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

impl<T: SyncObserver + ?Sized> SyncObserver for Arc<T> {
    fn run_started(&self) {
        (**self).run_started()
    }

    fn run_finished(&self, outcome: RunOutcome, elapsed: Duration) {
        (**self).run_finished(outcome, elapsed)
    }

    fn message_published(&self, topic: &str, key: &str) {
        (**self).message_published(topic, key)
    }
}

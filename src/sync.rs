//! One sync run: fetch versions and publish them concurrently.
//!
//! ```text
//!  ┌──────────┐   bounded mpsc<Version>   ┌────────────┐
//!  │  Fetch   │ ────────────────────────▶ │  Publish   │
//!  └────┬─────┘  closed when fetch ends   └─────┬──────┘
//!       │                                       │
//!       └──────────── run StopToken ────────────┘
//!            (child of the scheduler's token)
//! ```

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use versionwatch_adapters::{Fetch, FetchError, Publish, PublishError, StopToken};
use versionwatch_sdk::{NoopObserver, RunOutcome, SyncObserver};

use crate::race::{cancel_on_first_error, Task};

/// Why a sync run failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch versions failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("publish versions failed: {0}")]
    Publish(#[source] PublishError),
}

/// Channel capacity matching the number of CPUs, at least 1.
pub fn default_capacity() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Connects a fetcher and a publisher through a bounded channel.
pub struct Syncer<F, P> {
    fetcher: F,
    publisher: P,
    capacity: usize,
    observer: Arc<dyn SyncObserver>,
}

impl<F, P> Syncer<F, P>
where
    F: Fetch,
    P: Publish,
{
    pub fn new(fetcher: F, publisher: P) -> Self {
        Self {
            fetcher,
            publisher,
            capacity: default_capacity(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Override the channel capacity. Zero is raised to 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Report run start and outcome to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run fetch and publish once.
    ///
    /// The first failing phase stops the other and its error is returned.
    /// Stopping `stop` ends the run early without an error.
    pub async fn sync(&self, stop: &StopToken) -> Result<(), SyncError> {
        let started = Instant::now();
        self.observer.run_started();
        info!("sync started");

        let run = stop.child();
        let (tx, rx) = mpsc::channel(self.capacity);

        let fetch_stop = &run;
        let fetch = async move {
            self.fetcher
                .fetch(fetch_stop, tx)
                .await
                .map_err(SyncError::Fetch)
        };
        let publish_stop = &run;
        let publish = async move {
            self.publisher
                .publish(publish_stop, rx)
                .await
                .map_err(SyncError::Publish)
        };
        let tasks: Vec<Task<'_, SyncError>> = vec![Box::pin(fetch), Box::pin(publish)];

        let result = cancel_on_first_error(&run, tasks).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(()) => {
                self.observer.run_finished(RunOutcome::Succeeded, elapsed);
                info!(elapsed_ms = elapsed.as_millis() as u64, "sync finished");
            }
            Err(err) => {
                self.observer.run_finished(RunOutcome::Failed, elapsed);
                warn!(elapsed_ms = elapsed.as_millis() as u64, error = %err, "sync failed");
            }
        }
        result
    }
}

impl<F, P> std::fmt::Debug for Syncer<F, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syncer")
            .field("capacity", &self.capacity)
            .finish()
    }
}

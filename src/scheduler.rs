//! Fixed-delay scheduler.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info};

use versionwatch_adapters::StopToken;

/// Runs an action, waits, and runs it again until stopped.
///
/// The delay is measured from the end of one run to the start of the next,
/// so runs never overlap. A failed run is logged and the schedule goes on.
#[derive(Debug, Clone, Copy)]
pub struct WaitCron {
    wait: Duration,
}

impl WaitCron {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Loop until `stop` is stopped. Returns immediately if it already is.
    pub async fn run<A, Fut, E>(&self, stop: &StopToken, mut action: A)
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        loop {
            if stop.is_stopped() {
                info!("stop requested => return");
                return;
            }

            if let Err(err) = action().await {
                error!(error = %err, "action failed");
            }

            info!(wait = ?self.wait, "waiting for next run");
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    info!("stop requested => return");
                    return;
                }
                _ = tokio::time::sleep(self.wait) => {}
            }
        }
    }
}

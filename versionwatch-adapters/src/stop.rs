//! Cooperative cancellation shared by the tasks of a run.

use std::sync::Arc;

use futures_util::future::select_all;
use tokio::sync::watch;

/// A stop flag that can be checked and awaited.
///
/// Cloning shares the flag. [`StopToken::child`] creates a token that is
/// stopped whenever its parent is, but stopping the child leaves the parent
/// running: the scheduler's token governs the process, each sync run gets a
/// child it can stop on its first error.
///
/// # Example
///
/// ```rust
/// use versionwatch_adapters::StopToken;
///
/// let process = StopToken::new();
/// let run = process.child();
///
/// run.stop();
/// assert!(run.is_stopped());
/// assert!(!process.is_stopped());
///
/// let next_run = process.child();
/// process.stop();
/// assert!(next_run.is_stopped());
/// ```
#[derive(Debug, Clone)]
pub struct StopToken {
    // Own flag first, then every ancestor's.
    flags: Vec<Arc<watch::Sender<bool>>>,
}

impl StopToken {
    /// Create a token that is not stopped.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            flags: vec![Arc::new(tx)],
        }
    }

    /// Create a token that also stops when this one does.
    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(false);
        let mut flags = Vec::with_capacity(self.flags.len() + 1);
        flags.push(Arc::new(tx));
        flags.extend(self.flags.iter().cloned());
        Self { flags }
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.flags[0].send_replace(true);
    }

    /// Whether this token or any ancestor has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.flags.iter().any(|flag| *flag.borrow())
    }

    /// Resolves once this token or any ancestor is stopped.
    pub async fn stopped(&self) {
        let waits = self
            .flags
            .iter()
            .map(|flag| Box::pin(wait_for_stop(flag.subscribe())));
        select_all(waits).await;
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_stop(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without stopping: never resolves
            std::future::pending::<()>().await;
        }
    }
}

//! Run a group of futures that live and die together.
//!
//! Both combinators poll every task concurrently on the current task and
//! share one [`StopToken`]. They differ only in what ends the group: the
//! first error, or the first task to finish at all. Either way the token is
//! stopped and the remaining tasks are drained, never dropped mid-flight, so
//! every task gets to observe the stop and clean up.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use versionwatch_adapters::StopToken;

/// A boxed task taking part in a race group.
pub type Task<'a, E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'a>>;

/// Run `tasks` until all complete. The first error stops `stop` and is
/// returned once the others have unwound.
pub async fn cancel_on_first_error<E>(stop: &StopToken, tasks: Vec<Task<'_, E>>) -> Result<(), E> {
    let mut pending: FuturesUnordered<_> = tasks.into_iter().collect();
    let mut first_error = None;

    while let Some(result) = pending.next().await {
        if let Err(err) = result {
            if first_error.is_none() {
                debug!(remaining = pending.len(), "task failed => stop group");
                stop.stop();
                first_error = Some(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Run `tasks` until the first one completes, then stop `stop` and return
/// that task's result once the others have unwound.
pub async fn cancel_on_first_finish<E>(stop: &StopToken, tasks: Vec<Task<'_, E>>) -> Result<(), E> {
    let mut pending: FuturesUnordered<_> = tasks.into_iter().collect();

    let Some(first) = pending.next().await else {
        return Ok(());
    };
    debug!(remaining = pending.len(), ok = first.is_ok(), "task finished => stop group");
    stop.stop();

    while pending.next().await.is_some() {}
    first
}

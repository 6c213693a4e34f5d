//! Fixed-interval background sweeps.
//!
//! Both stores reclaim expired entries lazily on access; a sweeper only
//! frees memory early. It runs on the tokio runtime, ticks at a fixed
//! period, and stops when its handle is stopped or dropped.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Shortest period a sweeper will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running sweeper task.
///
/// Dropping the handle cancels the task; [`SweeperHandle::stop`] also waits
/// for it to finish.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Whether the sweeper task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the sweeper and wait for the task to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn a task that calls `sweep` every `period`.
///
/// The first sweep happens one full period after spawning. `sweep` returns
/// the number of items it removed, which is only used for logging.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper<F>(label: &'static str, period: Duration, mut sweep: F) -> SweeperHandle
where
    F: FnMut() -> usize + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(sweeper = label, "Sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = sweep();
                    trace!(sweeper = label, removed, "Sweep finished");
                }
            }
        }
    });

    debug!(sweeper = label, period_ms = period.as_millis() as u64, "Sweeper started");

    SweeperHandle {
        token,
        task: Some(task),
    }
}

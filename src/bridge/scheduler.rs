//! Cancellable periodic tasks.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a running periodic task.
///
/// Dropping it (or calling [`ScheduleHandle::stop`]) closes the control
/// channel; no tick fires after the task observes the close.
#[derive(Debug)]
pub struct ScheduleHandle {
    _stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Stop the task and wait for an in-flight tick to finish.
    pub async fn stop(self) {
        let Self { _stop_tx, task } = self;
        drop(_stop_tx);
        if let Err(e) = task.await {
            debug!("Scheduled task ended abnormally: {}", e);
        }
    }
}

/// Run `action` every `period`, first after one full period.
///
/// Ticks never overlap: a slow action delays the next tick.
pub fn schedule<F, Fut>(period: Duration, mut action: F) -> ScheduleHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.recv() => break,
                _ = ticker.tick() => action().await,
            }
        }
        debug!("Scheduled task stopped");
    });

    ScheduleHandle {
        _stop_tx: stop_tx,
        task,
    }
}

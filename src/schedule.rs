use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// A job run on a fixed period until cancelled.
///
/// The first run starts immediately. A run that outlasts the period delays
/// the next one rather than overlapping it. Dropping the handle cancels the
/// task as well, including a run that is in flight.
pub struct ScheduledTask {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn every<F, Fut>(period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel, mut cancelled) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticks = interval(period);
            loop {
                tokio::select! {
                    _ = &mut cancelled => break,
                    _ = ticks.tick() => {
                        tokio::select! {
                            _ = &mut cancelled => break,
                            _ = job() => {}
                        }
                    }
                }
            }
            debug!("Scheduled task stopped");
        });
        ScheduledTask { cancel, handle }
    }

    /// Stops the task and waits for it to wind down.
    pub async fn cancel(self) {
        let ScheduledTask { cancel, handle } = self;
        // The task may already have exited; nothing to tell it then.
        let _ = cancel.send(());
        let _ = handle.await;
    }
}

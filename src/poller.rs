use crate::client::{Endpoint, StatusClient};
use crate::schedule::ScheduledTask;
use crate::state::Update;
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Polls `endpoint` every `period` and forwards each decoded answer to the view.
/// Failed polls are logged and the schedule carries on.
pub fn spawn(
    client: StatusClient,
    endpoint: Endpoint,
    period: Duration,
    tx: Sender<Update>,
) -> ScheduledTask {
    info!("Polling {} every {:?}", endpoint, period);
    ScheduledTask::every(period, move || {
        let client = client.clone();
        let mut tx = tx.clone();
        async move {
            match client.fetch(endpoint).await {
                Ok(update) => {
                    if tx.send(update).await.is_err() {
                        debug!("View is gone; dropping {} update", endpoint);
                    }
                }
                Err(e) => error!("Error polling {}: {}", endpoint, e),
            }
        }
    })
}

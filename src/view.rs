use crate::dom::NodeId;
use crate::state::{AppState, Update};
use log::debug;
use std::time::Duration;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::time::delay_for;

/// Owns the application state and applies updates in arrival order.
/// Highlights added by an update are removed `highlight` later.
///
/// Runs until every producer has hung up, then hands the state back.
pub async fn run(
    mut state: AppState,
    mut updates: Receiver<Update>,
    highlight: Duration,
) -> AppState {
    let (expired_tx, mut expired) = channel::<NodeId>(32);
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => {
                    for node in state.apply(update) {
                        schedule_expiry(expired_tx.clone(), node, highlight);
                    }
                }
                None => break,
            },
            Some(node) = expired.recv() => state.clear_highlight(node),
        }
    }
    debug!("All producers gone; view stopping");
    state
}

fn schedule_expiry(mut tx: Sender<NodeId>, node: NodeId, after: Duration) {
    tokio::spawn(async move {
        delay_for(after).await;
        // The view may have stopped in the meantime.
        let _ = tx.send(node).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page;
    use crate::render::HIGHLIGHT_CLASS;
    use crate::types::{ParkingSnapshot, PushUpdate, SpotState, SpotStatus};

    fn snapshot() -> ParkingSnapshot {
        ParkingSnapshot {
            total_spots: 5,
            available: 3,
            occupied: 2,
            spots: vec![SpotStatus {
                id: "1".into(),
                status: SpotState::Occupied,
                plate: Some("XYZ1".into()),
                car_number: None,
            }],
        }
    }

    #[tokio::test]
    async fn applies_updates_in_arrival_order() {
        let (mut tx, rx) = channel(8);
        let view = tokio::spawn(run(
            AppState::new(page::dashboard()),
            rx,
            Duration::from_secs(60),
        ));
        tx.send(Update::Snapshot(snapshot())).await.unwrap();
        tx.send(Update::Push(PushUpdate {
            spot_number: "1".into(),
            status: SpotState::Available,
            plate: None,
        }))
        .await
        .unwrap();
        drop(tx);

        let state = view.await.unwrap();
        let doc = state.document();
        let card = doc.get_element_by_id("spot-1").unwrap();
        // Highlight still pending, push applied last.
        assert_eq!(doc.class_name(card), "parking-spot available");
        let plate = doc.query_selector(card, ".plate-info").unwrap();
        assert_eq!(doc.text_content(plate), "Plate: No plate detected");
    }

    #[tokio::test]
    async fn highlight_expires() {
        let (mut tx, rx) = channel(8);
        let view = tokio::spawn(run(
            AppState::new(page::dashboard()),
            rx,
            Duration::from_millis(20),
        ));
        tx.send(Update::Snapshot(snapshot())).await.unwrap();
        delay_for(Duration::from_millis(100)).await;
        drop(tx);

        let state = view.await.unwrap();
        let doc = state.document();
        let card = doc.get_element_by_id("spot-1").unwrap();
        assert!(!doc.has_class(card, HIGHLIGHT_CLASS));
        let total = doc.get_element_by_id("total-spots").unwrap();
        let stat_card = doc.parent(doc.parent(total).unwrap()).unwrap();
        assert!(!doc.has_class(stat_card, HIGHLIGHT_CLASS));
    }

    #[tokio::test]
    async fn highlight_is_present_right_after_a_change() {
        let (mut tx, rx) = channel(8);
        let view = tokio::spawn(run(
            AppState::new(page::dashboard()),
            rx,
            Duration::from_secs(60),
        ));
        tx.send(Update::Snapshot(snapshot())).await.unwrap();
        drop(tx);

        let state = view.await.unwrap();
        let doc = state.document();
        let card = doc.get_element_by_id("spot-1").unwrap();
        assert!(doc.has_class(card, HIGHLIGHT_CLASS));
    }
}

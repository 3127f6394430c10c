use crate::dom::{Document, NodeId};
use crate::render;
use crate::types::{ParkingSnapshot, PushUpdate, SpotMap};
use log::{debug, info};
use std::collections::HashMap;

/// Everything that can change the view. Pollers and the live channel only
/// produce these; the view task is the one place they are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Snapshot(ParkingSnapshot),
    SpotMap(SpotMap),
    Push(PushUpdate),
}

/// The document plus the last state the backend reported.
///
/// Polled payloads are stored exactly as received. Live updates go to a
/// separate per-spot overlay that the next poll of either endpoint clears.
#[derive(Debug)]
pub struct AppState {
    document: Document,
    snapshot: Option<ParkingSnapshot>,
    spot_map: Option<SpotMap>,
    live: HashMap<String, PushUpdate>,
}

impl AppState {
    pub fn new(document: Document) -> Self {
        AppState {
            document,
            snapshot: None,
            spot_map: None,
            live: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn snapshot(&self) -> Option<&ParkingSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn spot_map(&self) -> Option<&SpotMap> {
        self.spot_map.as_ref()
    }

    /// Latest live update for `spot` received since the last poll.
    pub fn live_update(&self, spot: &str) -> Option<&PushUpdate> {
        self.live.get(spot)
    }

    /// Applies `update` to the document and returns the nodes that were
    /// given the highlight class.
    pub fn apply(&mut self, update: Update) -> Vec<NodeId> {
        match update {
            Update::Snapshot(snapshot) => {
                let highlighted = render::render_snapshot(&mut self.document, &snapshot);
                for spot in &snapshot.spots {
                    let changed = match &self.snapshot {
                        Some(previous) => previous
                            .spots
                            .iter()
                            .find(|s| s.id == spot.id)
                            .map_or(true, |s| s.status != spot.status),
                        None => true,
                    };
                    if changed {
                        info!("Spot {} is {}", spot.id, spot.status);
                    }
                }
                self.snapshot = Some(snapshot);
                self.live.clear();
                highlighted
            }
            Update::SpotMap(map) => {
                for entry in &map.entries {
                    if !render::patch_spot(&mut self.document, entry) {
                        debug!("No element for spot {}", entry.spot);
                    }
                }
                self.spot_map = Some(map);
                self.live.clear();
                vec![]
            }
            Update::Push(update) => {
                if !render::apply_push(&mut self.document, &update) {
                    debug!("Ignoring live update for unknown spot {}", update.spot_number);
                    return vec![];
                }
                info!(
                    "Live update: spot {} is {} ({})",
                    update.spot_number,
                    update.status,
                    render::push_plate_line(update.plate.as_deref())
                );
                self.live.insert(update.spot_number.clone(), update);
                vec![]
            }
        }
    }

    pub fn clear_highlight(&mut self, node: NodeId) {
        render::clear_highlight(&mut self.document, node);
    }
}

//! Diff-and-patch helpers that project parking state onto the view document.
//!
//! Every function here tolerates missing targets: if the element it is asked
//! to touch is not in the document, nothing happens.

use crate::dom::{Document, NodeId};
use crate::types::{ParkingSnapshot, PushUpdate, SpotEntry, SpotState, SpotStatus};

pub const HIGHLIGHT_CLASS: &str = "updated";
pub const PARKING_GRID_ID: &str = "parking-grid";
pub const PLATE_INFO_CLASS: &str = "plate-info";
pub const STATUS_ATTRIBUTE: &str = "data-status";

pub const TOTAL_SPOTS_ID: &str = "total-spots";
pub const AVAILABLE_SPOTS_ID: &str = "available-spots";
pub const OCCUPIED_SPOTS_ID: &str = "occupied-spots";

pub const STAT_IDS: [(&str, &str); 3] = [
    (TOTAL_SPOTS_ID, "Total Spots"),
    (AVAILABLE_SPOTS_ID, "Available"),
    (OCCUPIED_SPOTS_ID, "Occupied"),
];

pub fn spot_element_id(spot: &str) -> String {
    format!("spot-{}", spot)
}

/// Plate line used on dashboard cards.
pub fn plate_line(plate: Option<&str>) -> String {
    match plate {
        Some(plate) => format!("Plate: {}", plate),
        None => "No plate detected".to_string(),
    }
}

/// Plate line written by live updates. The prefix stays even without a plate.
pub fn push_plate_line(plate: Option<&str>) -> String {
    format!("Plate: {}", plate.unwrap_or("No plate detected"))
}

/// Plate line used on the parking view, where free bays say so.
pub fn spot_map_plate_line(status: &SpotState, plate: Option<&str>) -> String {
    match (status.is_occupied(), plate) {
        (true, Some(plate)) => format!("Plate: {}", plate),
        (true, None) => "No plate detected".to_string(),
        (false, _) => "Available".to_string(),
    }
}

/// Writes `value` into the stat element if it differs from what is shown.
/// Returns the stat card that should be highlighted.
pub fn update_stat(doc: &mut Document, element_id: &str, value: i64) -> Option<NodeId> {
    let node = doc.get_element_by_id(element_id)?;
    if parse_leading_int(&doc.text_content(node)) == Some(value) {
        return None;
    }
    doc.set_text_content(node, &value.to_string());
    let card = doc.parent(node).and_then(|p| doc.parent(p))?;
    doc.add_class(card, HIGHLIGHT_CLASS);
    Some(card)
}

/// Renders the aggregate counters and every spot card of `snapshot`.
/// Returns all nodes that received the highlight class.
pub fn render_snapshot(doc: &mut Document, snapshot: &ParkingSnapshot) -> Vec<NodeId> {
    let mut highlighted = vec![];
    let stats = [
        (TOTAL_SPOTS_ID, snapshot.total_spots),
        (AVAILABLE_SPOTS_ID, snapshot.available),
        (OCCUPIED_SPOTS_ID, snapshot.occupied),
    ];
    for &(id, value) in stats.iter() {
        highlighted.extend(update_stat(doc, id, value));
    }
    for spot in &snapshot.spots {
        highlighted.extend(render_spot_card(doc, spot));
    }
    highlighted
}

/// Creates the card for `spot` on first sight and rewrites it when its status
/// changed. Returns the card if it was rewritten.
pub fn render_spot_card(doc: &mut Document, spot: &SpotStatus) -> Option<NodeId> {
    let element_id = spot_element_id(&spot.id);
    let node = match doc.get_element_by_id(&element_id) {
        Some(node) => node,
        None => {
            let grid = doc.get_element_by_id(PARKING_GRID_ID)?;
            let node = doc.create_element("div");
            doc.set_id(node, &element_id);
            doc.append_child(grid, node);
            node
        }
    };

    let status = spot.status.as_str();
    if doc.attribute(node, STATUS_ATTRIBUTE) == Some(status) {
        return None;
    }
    doc.set_class_name(node, &format!("parking-spot {}", status));
    doc.set_attribute(node, STATUS_ATTRIBUTE, status);
    doc.clear_children(node);
    doc.append_element(node, "h3", "", &format!("Spot {}", spot.id));
    doc.append_element(node, "p", "", &status.to_uppercase());
    doc.append_element(node, "p", PLATE_INFO_CLASS, &plate_line(spot.plate.as_deref()));
    let icon = if spot.status.is_occupied() {
        "fas fa-car"
    } else {
        "fas fa-square-parking"
    };
    doc.append_element(node, "i", icon, "");
    doc.add_class(node, HIGHLIGHT_CLASS);
    Some(node)
}

/// Patches an existing parking-view spot; never creates one.
/// Returns whether the spot was found.
pub fn patch_spot(doc: &mut Document, entry: &SpotEntry) -> bool {
    let node = match doc.get_element_by_id(&spot_element_id(&entry.spot)) {
        Some(node) => node,
        None => return false,
    };
    doc.set_class_name(node, &format!("spot {}", entry.status));
    if let Some(plate_info) = doc.query_selector(node, &format!(".{}", PLATE_INFO_CLASS)) {
        let text = spot_map_plate_line(&entry.status, entry.plate.as_deref());
        doc.set_text_content(plate_info, &text);
    }
    true
}

/// Applies a live update to an existing spot card. Returns whether the spot was found.
pub fn apply_push(doc: &mut Document, update: &PushUpdate) -> bool {
    let node = match doc.get_element_by_id(&spot_element_id(&update.spot_number)) {
        Some(node) => node,
        None => return false,
    };
    doc.set_class_name(node, &format!("parking-spot {}", update.status));
    if let Some(plate_info) = doc.query_selector(node, &format!(".{}", PLATE_INFO_CLASS)) {
        doc.set_text_content(plate_info, &push_plate_line(update.plate.as_deref()));
    }
    true
}

pub fn clear_highlight(doc: &mut Document, node: NodeId) {
    doc.remove_class(node, HIGHLIGHT_CLASS);
}

/// Reads a leading (optionally signed) integer, ignoring leading whitespace
/// and anything after the digits.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = if text.starts_with('-') || text.starts_with('+') {
        1
    } else {
        0
    };
    let digits_end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| i + digits_start)
        .unwrap_or_else(|| text.len());
    if digits_end == digits_start {
        return None;
    }
    text[..digits_end].parse().ok()
}

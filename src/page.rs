//! Initial layouts of the two views.

use crate::dom::Document;
use crate::render::{spot_element_id, PARKING_GRID_ID, PLATE_INFO_CLASS, STAT_IDS};

/// Stat cards plus an empty `#parking-grid`; spot cards appear as the poller sees them.
pub fn dashboard() -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    let stats = doc.append_element(body, "div", "stats", "");
    for &(id, label) in STAT_IDS.iter() {
        let card = doc.append_element(stats, "div", "stat-card", "");
        let content = doc.append_element(card, "div", "stat-content", "");
        doc.append_element(content, "h4", "stat-label", label);
        let value = doc.append_element(content, "span", "stat-value", "0");
        doc.set_id(value, id);
    }
    let grid = doc.append_element(body, "div", "parking-grid", "");
    doc.set_id(grid, PARKING_GRID_ID);
    doc
}

/// A fixed lot of `spot_count` bays numbered from 1, all shown as available
/// until the first poll says otherwise.
pub fn parking(spot_count: usize) -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    let lot = doc.append_element(body, "div", "parking-lot", "");
    for number in 1..=spot_count {
        let spot = doc.append_element(lot, "div", "spot available", "");
        doc.set_id(spot, &spot_element_id(&number.to_string()));
        doc.append_element(spot, "div", "spot-number", &number.to_string());
        doc.append_element(spot, "div", PLATE_INFO_CLASS, "Available");
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_stat_values_sit_two_levels_below_their_card() {
        let doc = dashboard();
        for &(id, _) in STAT_IDS.iter() {
            let value = doc.get_element_by_id(id).unwrap();
            assert_eq!(doc.text_content(value), "0");
            let card = doc.parent(doc.parent(value).unwrap()).unwrap();
            assert!(doc.has_class(card, "stat-card"));
        }
        assert!(doc.get_element_by_id(PARKING_GRID_ID).is_some());
    }

    #[test]
    fn parking_page_prerenders_every_spot() {
        let doc = parking(12);
        for n in 1..=12 {
            let spot = doc.get_element_by_id(&format!("spot-{}", n)).unwrap();
            assert_eq!(doc.class_name(spot), "spot available");
            let plate = doc.query_selector(spot, ".plate-info").unwrap();
            assert_eq!(doc.text_content(plate), "Available");
        }
        assert!(doc.get_element_by_id("spot-13").is_none());
    }
}

//! Component placement spacing.
//!
//! Placement lists come either from a pick-and-place style JSON file or from
//! the board's own footprints. Footprints from a mounting-hole library are
//! treated as holes, which block parts on both sides of the board.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::config::RuleConfig;
use crate::geometry::{below, distance, Point};
use crate::model::{Board, Side};
use crate::violation::{CheckId, Violation};

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Failed to read placement file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse placement JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub reference: String,
    pub x: f64,
    pub y: f64,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountingHole {
    pub x: f64,
    pub y: f64,
}

impl MountingHole {
    pub fn label(&self) -> String {
        format!("MH@{:.0},{:.0}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementList {
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub mounting_holes: Vec<MountingHole>,
}

impl PlacementList {
    pub fn from_json_str(json: &str) -> Result<Self, PlacementError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, PlacementError> {
        let content = std::fs::read_to_string(path)?;
        let list = Self::from_json_str(&content)?;
        tracing::info!(
            placements = list.placements.len(),
            mounting_holes = list.mounting_holes.len(),
            file = %path.display(),
            "loaded placement list"
        );
        Ok(list)
    }

    pub fn from_board(board: &Board) -> Self {
        let mut list = Self::default();
        for fp in &board.footprints {
            if fp.is_mounting_hole() {
                list.mounting_holes.push(MountingHole {
                    x: fp.position.x,
                    y: fp.position.y,
                });
            } else {
                list.placements.push(Placement {
                    reference: fp.reference.clone(),
                    x: fp.position.x,
                    y: fp.position.y,
                    side: fp.side,
                });
            }
        }
        list
    }
}

struct Item {
    label: String,
    at: Point,
    /// `None` for mounting holes.
    side: Option<Side>,
}

impl Item {
    fn competes_with(&self, other: &Item) -> bool {
        match (self.side, other.side) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Every pair of placed items that can collide and whose centers are closer
/// than `min_component_spacing`.
pub fn check_component_overlap(list: &PlacementList, config: &RuleConfig) -> Vec<Violation> {
    let min = config.min_component_spacing;
    let items: Vec<Item> = list
        .placements
        .iter()
        .map(|p| Item {
            label: p.reference.clone(),
            at: Point::new(p.x, p.y),
            side: Some(p.side),
        })
        .chain(list.mounting_holes.iter().map(|h| Item {
            label: h.label(),
            at: Point::new(h.x, h.y),
            side: None,
        }))
        .collect();

    let mut violations = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            if !a.competes_with(b) {
                continue;
            }
            let d = distance(a.at, b.at);
            if below(d, min) {
                violations.push(
                    Violation::new(
                        CheckId::ComponentOverlap,
                        format!("{} <-> {}: {:.1}mm apart (min {}mm)", a.label, b.label, d, min),
                    )
                    .at(a.at)
                    .with_items([a.label.as_str(), b.label.as_str()]),
                );
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Footprint;

    fn placement(reference: &str, x: f64, y: f64, side: Side) -> Placement {
        Placement {
            reference: reference.to_string(),
            x,
            y,
            side,
        }
    }

    #[test]
    fn test_overlap_on_same_side() {
        let list = PlacementList {
            placements: vec![
                placement("C1", 10.0, 10.0, Side::Bottom),
                placement("C2", 12.0, 10.0, Side::Bottom),
                placement("SW1", 11.0, 10.0, Side::Top),
            ],
            mounting_holes: vec![],
        };
        let violations = check_component_overlap(&list, &RuleConfig::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "C1 <-> C2: 2.0mm apart (min 3mm)");
    }

    #[test]
    fn test_mounting_hole_blocks_both_sides() {
        let list = PlacementList {
            placements: vec![
                placement("U1", 10.0, 11.0, Side::Bottom),
                placement("SW1", 11.0, 10.0, Side::Top),
            ],
            mounting_holes: vec![MountingHole { x: 10.0, y: 10.0 }],
        };
        let violations = check_component_overlap(&list, &RuleConfig::default());
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "U1 <-> MH@10,10: 1.0mm apart (min 3mm)",
                "SW1 <-> MH@10,10: 1.0mm apart (min 3mm)",
            ]
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "placements": [{"reference": "U1", "x": 80.0, "y": 37.5, "side": "bottom"}],
            "mounting_holes": [{"x": 10.0, "y": 7.0}]
        }"#;
        let list = PlacementList::from_json_str(json).unwrap();
        assert_eq!(list.placements[0].side, Side::Bottom);
        assert_eq!(list.mounting_holes[0].label(), "MH@10,7");
        assert!(PlacementList::from_json_str("{\"placements\": 3}").is_err());
    }

    #[test]
    fn test_from_board_splits_mounting_holes() {
        let footprint = |reference: &str, library: &str, x: f64| Footprint {
            uuid: String::new(),
            reference: reference.to_string(),
            library: library.to_string(),
            side: Side::Bottom,
            position: Point::new(x, 20.0),
            rotation: 0.0,
            pads: vec![],
        };
        let board = Board {
            footprints: vec![
                footprint("R1", "Resistor_SMD:R_0805", 30.0),
                footprint("H1", "MountingHole:MountingHole_2.5mm", 10.0),
            ],
            ..Default::default()
        };
        let list = PlacementList::from_board(&board);
        assert_eq!(list.placements.len(), 1);
        assert_eq!(list.placements[0].reference, "R1");
        assert_eq!(list.mounting_holes, vec![MountingHole { x: 10.0, y: 20.0 }]);
    }
}

//! Board Model
//!
//! Typed, read-only view of a routed board. A [`Board`] is built once per
//! verification run (normally by [`crate::parser::BoardParser`]) and only
//! borrowed by the checks afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::geometry::{bounding_box, Point, Rect, AXIS_TOLERANCE};

/// Structural invariant broken by a board description.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{element} references undeclared net {net}")]
    UnknownNet { element: String, net: u32 },
    #[error("segment {uuid} has non-positive width {width}")]
    NonPositiveWidth { uuid: String, width: f64 },
}

/// Net declaration. Id 0 is the reserved "unconnected" net and never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: u32,
    pub name: String,
}

/// One straight copper trace run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub uuid: String,
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub layer: String,
    pub net: u32,
}

impl Segment {
    pub fn new(start: Point, end: Point, width: f64, layer: &str, net: u32) -> Self {
        Self {
            uuid: String::new(),
            start,
            end,
            width,
            layer: layer.to_string(),
            net,
        }
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn is_horizontal(&self) -> bool {
        (self.start.y - self.end.y).abs() < AXIS_TOLERANCE
    }

    pub fn is_vertical(&self) -> bool {
        (self.start.x - self.end.x).abs() < AXIS_TOLERANCE
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.start.x.min(self.end.x), self.start.x.max(self.end.x))
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.start.y.min(self.end.y), self.start.y.max(self.end.y))
    }

    /// `(x1,y1)->(x2,y2)`, the form used in violation messages.
    pub fn describe(&self) -> String {
        format!("{}->{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub uuid: String,
    pub position: Point,
    /// Pad diameter.
    pub size: f64,
    /// Hole diameter.
    pub drill: f64,
    pub layers: (String, String),
    pub net: u32,
}

impl Via {
    pub fn new(position: Point, size: f64, drill: f64, net: u32) -> Self {
        Self {
            uuid: String::new(),
            position,
            size,
            drill,
            layers: ("F.Cu".to_string(), "B.Cu".to_string()),
            net,
        }
    }

    /// Copper left around the hole: `(size - drill) / 2`. Negative when the
    /// drill is wider than the pad.
    pub fn annular_ring(&self) -> f64 {
        (self.size - self.drill) / 2.0
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn drill_radius(&self) -> f64 {
        self.drill / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadKind {
    ThruHole,
    Smd,
    Connect,
    NpThruHole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub number: String,
    pub kind: PadKind,
    /// Absolute board position.
    pub position: Point,
    pub size_w: f64,
    pub size_h: f64,
    /// 0 for surface-mount pads.
    pub drill: f64,
    pub net: u32,
    pub layer: String,
}

impl Pad {
    pub fn is_drilled(&self) -> bool {
        self.drill > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    pub fn from_layer(layer: &str) -> Self {
        if layer.starts_with("B.") {
            Side::Bottom
        } else {
            Side::Top
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub uuid: String,
    pub reference: String,
    pub library: String,
    pub side: Side,
    pub position: Point,
    pub rotation: f64,
    pub pads: Vec<Pad>,
}

impl Footprint {
    pub fn is_mounting_hole(&self) -> bool {
        self.library.to_ascii_lowercase().contains("mountinghole")
    }
}

/// Copper pour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub uuid: String,
    pub net: u32,
    pub net_name: String,
    pub layer: String,
    /// `None` when the file carries no `(priority n)`; fill order is then undefined.
    pub priority: Option<u32>,
    /// Rasterized fill data is present.
    pub filled: bool,
    pub filled_polygons: usize,
    pub outline: Vec<Point>,
}

impl Zone {
    pub fn bounding_box(&self) -> Option<Rect> {
        bounding_box(self.outline.iter().copied())
    }
}

/// Named rectangular opening milled through the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutout {
    pub name: String,
    pub rect: Rect,
}

impl Cutout {
    pub fn new(name: &str, rect: Rect) -> Self {
        Self {
            name: name.to_string(),
            rect,
        }
    }
}

/// Element counts, printed before the checks run and embedded in reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub segments: usize,
    pub vias: usize,
    pub nets: usize,
    pub footprints: usize,
    pub pads: usize,
    pub drilled_pads: usize,
    pub zones: usize,
    pub filled_polygons: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub filename: String,
    /// Bounding box of the `Edge.Cuts` outline, if the file draws one.
    pub outline: Option<Rect>,
    pub cutouts: Vec<Cutout>,
    pub nets: Vec<Net>,
    pub segments: Vec<Segment>,
    pub vias: Vec<Via>,
    pub footprints: Vec<Footprint>,
    pub zones: Vec<Zone>,
}

impl Board {
    pub fn width(&self) -> Option<f64> {
        self.outline.map(|r| r.width())
    }

    pub fn height(&self) -> Option<f64> {
        self.outline.map(|r| r.height())
    }

    pub fn pads(&self) -> impl Iterator<Item = &Pad> {
        self.footprints.iter().flat_map(|fp| fp.pads.iter())
    }

    pub fn net_name(&self, id: u32) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.name.as_str())
    }

    /// Segments grouped per copper layer; layer order is stable across runs.
    pub fn segments_by_layer(&self) -> BTreeMap<&str, Vec<&Segment>> {
        let mut by_layer: BTreeMap<&str, Vec<&Segment>> = BTreeMap::new();
        for seg in &self.segments {
            by_layer.entry(seg.layer.as_str()).or_default().push(seg);
        }
        by_layer
    }

    pub fn zones_by_layer(&self) -> BTreeMap<&str, Vec<&Zone>> {
        let mut by_layer: BTreeMap<&str, Vec<&Zone>> = BTreeMap::new();
        for zone in &self.zones {
            by_layer.entry(zone.layer.as_str()).or_default().push(zone);
        }
        by_layer
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            segments: self.segments.len(),
            vias: self.vias.len(),
            nets: self.nets.len(),
            footprints: self.footprints.len(),
            pads: self.pads().count(),
            drilled_pads: self.pads().filter(|p| p.is_drilled()).count(),
            zones: self.zones.len(),
            filled_polygons: self.zones.iter().map(|z| z.filled_polygons).sum(),
        }
    }

    /// Enforce the structural invariants: positive segment widths and net
    /// references that are either 0 or declared.
    pub fn validate(&self) -> Result<(), ModelError> {
        let declared: HashSet<u32> = self.nets.iter().map(|n| n.id).collect();
        let check_net = |element: String, net: u32| {
            if net == 0 || declared.contains(&net) {
                Ok(())
            } else {
                Err(ModelError::UnknownNet { element, net })
            }
        };

        for seg in &self.segments {
            if !(seg.width > 0.0) {
                return Err(ModelError::NonPositiveWidth {
                    uuid: seg.uuid.clone(),
                    width: seg.width,
                });
            }
            check_net(format!("segment {}", seg.describe()), seg.net)?;
        }
        for via in &self.vias {
            check_net(format!("via at {}", via.position), via.net)?;
        }
        for fp in &self.footprints {
            for pad in &fp.pads {
                check_net(format!("pad {}.{}", fp.reference, pad.number), pad.net)?;
            }
        }
        for zone in &self.zones {
            check_net(format!("zone {} on {}", zone.net_name, zone.layer), zone.net)?;
        }
        Ok(())
    }
}

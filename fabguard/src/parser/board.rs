//! KiCad board parser
//!
//! Turns `.kicad_pcb` S-expression text into a [`Board`]. Only the fields the
//! checks need are extracted:
//! - `net` declarations, `segment`, `via` and `zone` items
//! - `footprint` (or legacy `module`) placements with their pads
//! - `Edge.Cuts` graphics, which give the board outline and internal cutouts
//!
//! Anything else in the file is ignored. A missing required field or a
//! malformed number aborts the parse; the checks never see a partial board.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{bounding_box, Point, Rect};
use crate::model::*;
use crate::parser::sexp::{ParseError, SExp, SExpParser};

const EDGE_CUTS: &str = "Edge.Cuts";

#[derive(Debug, Error)]
pub enum BoardParseError {
    #[error("S-expression parse error: {0}")]
    SExp(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid board format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field '{field}' in {element}")]
    MissingField { element: String, field: String },
    #[error("Invalid number '{value}' for '{field}' in {element}")]
    InvalidNumber {
        element: String,
        field: String,
        value: String,
    },
    #[error("Invalid board: {0}")]
    Model(#[from] ModelError),
}

fn missing(element: &str, field: &str) -> BoardParseError {
    BoardParseError::MissingField {
        element: element.to_string(),
        field: field.to_string(),
    }
}

/// Parser for KiCad 6+ board files.
pub struct BoardParser;

impl BoardParser {
    pub fn parse_file(path: &Path) -> Result<Board, BoardParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let board = Self::parse_str(&content, filename)?;
        let summary = board.summary();
        tracing::info!(
            file = %path.display(),
            segments = summary.segments,
            vias = summary.vias,
            nets = summary.nets,
            pads = summary.pads,
            zones = summary.zones,
            "parsed board"
        );
        Ok(board)
    }

    pub fn parse_str(content: &str, filename: &str) -> Result<Board, BoardParseError> {
        let root = SExpParser::new(content).parse()?;

        match root.head() {
            Some("kicad_pcb") => {}
            Some(other) => {
                return Err(BoardParseError::InvalidFormat(format!(
                    "expected kicad_pcb root, found {}",
                    other
                )))
            }
            None => {
                return Err(BoardParseError::InvalidFormat(
                    "expected kicad_pcb root".to_string(),
                ))
            }
        }

        let mut board = Board {
            filename: filename.to_string(),
            ..Default::default()
        };
        let mut edge_points = Vec::new();
        let mut edge_rects = Vec::new();
        let mut edge_lines = Vec::new();

        for item in root.as_list().unwrap_or_default().iter().skip(1) {
            match item.head() {
                Some("net") => {
                    if let Some(net) = Self::parse_net(item)? {
                        board.nets.push(net);
                    }
                }
                Some("segment") => {
                    let index = board.segments.len();
                    board.segments.push(Self::parse_segment(item, filename, index)?);
                }
                Some("via") => {
                    let index = board.vias.len();
                    board.vias.push(Self::parse_via(item, filename, index)?);
                }
                Some("zone") => {
                    let index = board.zones.len();
                    board.zones.extend(Self::parse_zone(item, filename, index)?);
                }
                Some("footprint") | Some("module") => {
                    let index = board.footprints.len();
                    board
                        .footprints
                        .push(Self::parse_footprint(item, filename, index)?);
                }
                Some(tag @ ("gr_line" | "gr_arc" | "gr_poly" | "gr_rect")) => {
                    if item.value("layer") != Some(EDGE_CUTS) {
                        continue;
                    }
                    match tag {
                        "gr_rect" => {
                            let start = Self::point(item, "start", tag)?;
                            let end = Self::point(item, "end", tag)?;
                            edge_rects.push(Rect::new(start.x, start.y, end.x, end.y));
                        }
                        "gr_line" => {
                            let start = Self::point(item, "start", tag)?;
                            let end = Self::point(item, "end", tag)?;
                            edge_points.extend([start, end]);
                            edge_lines.push((start, end));
                        }
                        _ => {
                            let points = Self::graphic_points(item, tag)?;
                            if tag == "gr_poly" {
                                edge_rects.extend(polygon_rect(&points));
                            }
                            edge_points.extend(points);
                        }
                    }
                }
                _ => {}
            }
        }

        edge_rects.extend(line_rects(&edge_lines));
        let (outline, cutouts) = Self::resolve_outline(&edge_points, &edge_rects);
        board.outline = outline;
        board.cutouts = cutouts;

        board.validate()?;
        tracing::debug!(filename, cutouts = board.cutouts.len(), "board model built");
        Ok(board)
    }

    fn element_uuid(node: &SExp, filename: &str, kind: &str, index: usize) -> String {
        node.value("uuid")
            .or_else(|| node.value("tstamp"))
            .map(str::to_string)
            .unwrap_or_else(|| {
                let name = format!("{}:{}:{}", filename, kind, index);
                Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
            })
    }

    fn number(node: &SExp, index: usize, element: &str) -> Result<f64, BoardParseError> {
        let field = node.head().unwrap_or_default();
        let raw = node.atom(index).ok_or_else(|| missing(element, field))?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| BoardParseError::InvalidNumber {
                element: element.to_string(),
                field: field.to_string(),
                value: raw.to_string(),
            })
    }

    fn required(node: &SExp, key: &str, element: &str) -> Result<f64, BoardParseError> {
        let child = node.find(key).ok_or_else(|| missing(element, key))?;
        Self::number(child, 1, element)
    }

    fn optional_id(node: &SExp, key: &str, element: &str) -> Result<Option<u32>, BoardParseError> {
        match node.find(key) {
            None => Ok(None),
            Some(child) => {
                let raw = child.atom(1).ok_or_else(|| missing(element, key))?;
                raw.parse::<u32>()
                    .map(Some)
                    .map_err(|_| BoardParseError::InvalidNumber {
                        element: element.to_string(),
                        field: key.to_string(),
                        value: raw.to_string(),
                    })
            }
        }
    }

    fn point(node: &SExp, key: &str, element: &str) -> Result<Point, BoardParseError> {
        let child = node.find(key).ok_or_else(|| missing(element, key))?;
        Ok(Point::new(
            Self::number(child, 1, element)?,
            Self::number(child, 2, element)?,
        ))
    }

    /// `(at x y [angle])`
    fn placement(node: &SExp, element: &str) -> Result<(Point, f64), BoardParseError> {
        let at = node.find("at").ok_or_else(|| missing(element, "at"))?;
        let position = Point::new(Self::number(at, 1, element)?, Self::number(at, 2, element)?);
        let rotation = match at.atom(3) {
            Some(_) => Self::number(at, 3, element)?,
            None => 0.0,
        };
        Ok((position, rotation))
    }

    fn pts(node: &SExp, element: &str) -> Result<Vec<Point>, BoardParseError> {
        node.find_all("xy")
            .map(|xy| Ok(Point::new(Self::number(xy, 1, element)?, Self::number(xy, 2, element)?)))
            .collect()
    }

    fn parse_net(node: &SExp) -> Result<Option<Net>, BoardParseError> {
        let element = "net declaration";
        let raw = node.atom(1).ok_or_else(|| missing(element, "net"))?;
        let id = raw
            .parse::<u32>()
            .map_err(|_| BoardParseError::InvalidNumber {
                element: element.to_string(),
                field: "net".to_string(),
                value: raw.to_string(),
            })?;
        let name = node.atom(2).unwrap_or_default();
        if id == 0 || name.is_empty() {
            return Ok(None);
        }
        Ok(Some(Net {
            id,
            name: name.to_string(),
        }))
    }

    fn parse_segment(node: &SExp, filename: &str, index: usize) -> Result<Segment, BoardParseError> {
        let element = format!("segment #{}", index + 1);
        Ok(Segment {
            uuid: Self::element_uuid(node, filename, "segment", index),
            start: Self::point(node, "start", &element)?,
            end: Self::point(node, "end", &element)?,
            width: Self::required(node, "width", &element)?,
            layer: node
                .value("layer")
                .ok_or_else(|| missing(&element, "layer"))?
                .to_string(),
            net: Self::optional_id(node, "net", &element)?.unwrap_or(0),
        })
    }

    fn parse_via(node: &SExp, filename: &str, index: usize) -> Result<Via, BoardParseError> {
        let element = format!("via #{}", index + 1);
        let (position, _) = Self::placement(node, &element)?;
        let layers = node
            .find("layers")
            .map(|l| {
                (
                    l.atom(1).unwrap_or("F.Cu").to_string(),
                    l.atom(2).unwrap_or("B.Cu").to_string(),
                )
            })
            .unwrap_or_else(|| ("F.Cu".to_string(), "B.Cu".to_string()));

        Ok(Via {
            uuid: Self::element_uuid(node, filename, "via", index),
            position,
            size: Self::required(node, "size", &element)?,
            drill: Self::required(node, "drill", &element)?,
            layers,
            net: Self::optional_id(node, "net", &element)?.unwrap_or(0),
        })
    }

    /// One [`Zone`] per copper layer the zone is declared on. Rule areas
    /// (`keepout`) carry no copper and yield nothing.
    fn parse_zone(node: &SExp, filename: &str, index: usize) -> Result<Vec<Zone>, BoardParseError> {
        if node.find("keepout").is_some() {
            return Ok(Vec::new());
        }
        let element = format!("zone #{}", index + 1);
        let layers: Vec<String> = match (node.value("layer"), node.find("layers")) {
            (Some(layer), _) => vec![layer.to_string()],
            (None, Some(list)) => list
                .as_list()
                .unwrap_or_default()
                .iter()
                .skip(1)
                .filter_map(SExp::as_atom)
                .map(str::to_string)
                .collect(),
            (None, None) => Vec::new(),
        };
        if layers.is_empty() {
            return Err(missing(&element, "layer"));
        }

        let outline = match node.find("polygon").and_then(|p| p.find("pts")) {
            Some(pts) => Self::pts(pts, &element)?,
            None => Vec::new(),
        };
        let net = Self::optional_id(node, "net", &element)?.unwrap_or(0);
        let net_name = node.value("net_name").unwrap_or_default().to_string();
        let priority = Self::optional_id(node, "priority", &element)?;
        let uuid = Self::element_uuid(node, filename, "zone", index);

        Ok(layers
            .into_iter()
            .map(|layer| {
                let filled_polygons = node
                    .find_all("filled_polygon")
                    .filter(|fp| fp.value("layer").map_or(true, |l| l == layer))
                    .count();
                Zone {
                    uuid: uuid.clone(),
                    net,
                    net_name: net_name.clone(),
                    layer,
                    priority,
                    filled: filled_polygons > 0,
                    filled_polygons,
                    outline: outline.clone(),
                }
            })
            .collect())
    }

    fn parse_footprint(node: &SExp, filename: &str, index: usize) -> Result<Footprint, BoardParseError> {
        let library = node.atom(1).unwrap_or_default().to_string();
        let element = format!("footprint {}", if library.is_empty() { "<unnamed>" } else { library.as_str() });
        let (position, rotation) = Self::placement(node, &element)?;
        let layer = node.value("layer").unwrap_or("F.Cu");

        let reference = node
            .find_all("property")
            .find(|p| p.atom(1) == Some("Reference"))
            .and_then(|p| p.atom(2))
            .or_else(|| {
                node.find_all("fp_text")
                    .find(|t| t.atom(1) == Some("reference"))
                    .and_then(|t| t.atom(2))
            })
            .unwrap_or_default()
            .to_string();

        let pads = node
            .find_all("pad")
            .map(|pad| Self::parse_pad(pad, position, rotation, layer, &element))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Footprint {
            uuid: Self::element_uuid(node, filename, "footprint", index),
            reference,
            library,
            side: Side::from_layer(layer),
            position,
            rotation,
            pads,
        })
    }

    fn parse_pad(
        node: &SExp,
        origin: Point,
        rotation: f64,
        footprint_layer: &str,
        footprint: &str,
    ) -> Result<Pad, BoardParseError> {
        let number = node.atom(1).unwrap_or_default().to_string();
        let element = format!("pad '{}' of {}", number, footprint);
        let kind = match node.atom(2) {
            Some("thru_hole") => PadKind::ThruHole,
            Some("np_thru_hole") => PadKind::NpThruHole,
            Some("connect") => PadKind::Connect,
            _ => PadKind::Smd,
        };

        let (offset, _) = Self::placement(node, &element)?;
        let size = node.find("size").ok_or_else(|| missing(&element, "size"))?;
        let size_w = Self::number(size, 1, &element)?;
        let size_h = match size.atom(2) {
            Some(_) => Self::number(size, 2, &element)?,
            None => size_w,
        };

        // (drill 1.0), (drill oval 1.0 2.0) or (drill 1.0 (offset ..))
        let drill = match node.find("drill") {
            Some(d) => {
                let index = if d.atom(1) == Some("oval") { 2 } else { 1 };
                Self::number(d, index, &element)?
            }
            None => 0.0,
        };

        let layer = node
            .find("layers")
            .and_then(|l| {
                l.as_list()
                    .unwrap_or_default()
                    .iter()
                    .skip(1)
                    .filter_map(SExp::as_atom)
                    .find(|name| name.ends_with(".Cu"))
            })
            .unwrap_or(footprint_layer)
            .to_string();

        Ok(Pad {
            number,
            kind,
            position: offset.rotated(rotation).offset(origin),
            size_w,
            size_h,
            drill,
            net: Self::optional_id(node, "net", &element)?.unwrap_or(0),
            layer,
        })
    }

    fn graphic_points(node: &SExp, tag: &str) -> Result<Vec<Point>, BoardParseError> {
        if tag == "gr_poly" {
            return match node.find("pts") {
                Some(pts) => Self::pts(pts, tag),
                None => Err(missing(tag, "pts")),
            };
        }
        let mut points = vec![Self::point(node, "start", tag)?, Self::point(node, "end", tag)?];
        if node.find("mid").is_some() {
            points.push(Self::point(node, "mid", tag)?);
        }
        Ok(points)
    }

    /// The outline is the bounding box of every `Edge.Cuts` item. Rectangles
    /// (`gr_rect`, four-corner `gr_poly`, or four `gr_line`s forming a closed
    /// loop) lying strictly inside it are milled cutouts.
    fn resolve_outline(points: &[Point], rects: &[Rect]) -> (Option<Rect>, Vec<Cutout>) {
        let corners = rects
            .iter()
            .flat_map(|r| [Point::new(r.min_x, r.min_y), Point::new(r.max_x, r.max_y)]);
        let outline = match bounding_box(points.iter().copied().chain(corners)) {
            Some(rect) => rect,
            None => return (None, Vec::new()),
        };

        let cutouts = rects
            .iter()
            .filter(|r| outline.encloses(r))
            .enumerate()
            .map(|(i, r)| Cutout::new(&format!("cutout {}", i + 1), *r))
            .collect();
        (Some(outline), cutouts)
    }
}

const COORD_EPS: f64 = 1e-6;

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < COORD_EPS && (a.y - b.y).abs() < COORD_EPS
}

/// The rectangle traced by exactly four axis-aligned edges, one per side.
fn loop_rect(edges: &[(Point, Point)]) -> Option<Rect> {
    if edges.len() != 4 {
        return None;
    }
    let rect = bounding_box(edges.iter().flat_map(|&(a, b)| [a, b]))?;
    if rect.width() < COORD_EPS || rect.height() < COORD_EPS {
        return None;
    }
    let on = |v: f64, lo: f64, hi: f64| (v - lo).abs() < COORD_EPS || (v - hi).abs() < COORD_EPS;
    let is_corner = |p: Point| on(p.x, rect.min_x, rect.max_x) && on(p.y, rect.min_y, rect.max_y);

    // Side key: (horizontal, lies on the min coordinate).
    let mut sides = Vec::with_capacity(4);
    for &(a, b) in edges {
        if !is_corner(a) || !is_corner(b) || same_point(a, b) {
            return None;
        }
        let side = if (a.y - b.y).abs() < COORD_EPS {
            (true, (a.y - rect.min_y).abs() < COORD_EPS)
        } else if (a.x - b.x).abs() < COORD_EPS {
            (false, (a.x - rect.min_x).abs() < COORD_EPS)
        } else {
            return None;
        };
        if sides.contains(&side) {
            return None;
        }
        sides.push(side);
    }
    Some(rect)
}

/// A `gr_poly` with four axis-aligned corners, closed or not.
fn polygon_rect(points: &[Point]) -> Option<Rect> {
    let mut corners = points.to_vec();
    if corners.len() == 5 && same_point(corners[0], corners[4]) {
        corners.pop();
    }
    if corners.len() != 4 {
        return None;
    }
    let edges: Vec<_> = (0..4).map(|i| (corners[i], corners[(i + 1) % 4])).collect();
    loop_rect(&edges)
}

/// Rectangles drawn as four separate `gr_line`s. Lines are grouped by shared
/// endpoints; a group of four that closes into a rectangle counts.
fn line_rects(lines: &[(Point, Point)]) -> Vec<Rect> {
    let mut parent: Vec<usize> = (0..lines.len()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..lines.len() {
        for j in i + 1..lines.len() {
            let (a, b) = (lines[i], lines[j]);
            let touching = [a.0, a.1]
                .iter()
                .any(|&p| same_point(p, b.0) || same_point(p, b.1));
            if touching {
                let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                parent[rj] = ri;
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<(Point, Point)>> = BTreeMap::new();
    for (i, &line) in lines.iter().enumerate() {
        groups.entry(root(&mut parent, i)).or_default().push(line);
    }
    groups.values().filter_map(|edges| loop_rect(edges)).collect()
}

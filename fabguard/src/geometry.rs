//! Geometry primitives shared by every check.
//!
//! All coordinates are board millimetres with KiCad's orientation (y grows
//! downwards). Every function here is pure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Segment;

/// Endpoints closer than this on one axis make a segment axis-aligned.
pub const AXIS_TOLERANCE: f64 = 0.01;

/// Floating point noise ignored by threshold comparisons.
pub const EPSILON: f64 = 1e-9;

/// `value < limit`, ignoring differences below [`EPSILON`].
///
/// Thresholds such as `(0.56 - 0.3) / 2 < 0.13` must not trip on the last bit
/// of an f64.
pub fn below(value: f64, limit: f64) -> bool {
    value < limit - EPSILON
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate around the origin by `degrees`, counter-clockwise as drawn (y down),
    /// which is how KiCad applies footprint rotation to pad offsets.
    pub fn rotated(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = (-degrees.to_radians()).sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn offset(self, by: Point) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Axis-aligned rectangle, always stored normalized (`min <= max`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    pub fn grow(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Overlap with positive area; rectangles that only share an edge are disjoint.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// True when `other` lies strictly inside `self`.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.min_x > self.min_x
            && other.max_x < self.max_x
            && other.min_y > self.min_y
            && other.max_y < self.max_y
    }
}

pub fn bounding_box<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = Point>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut rect = Rect::new(first.x, first.y, first.x, first.y);
    for p in iter {
        rect.min_x = rect.min_x.min(p.x);
        rect.min_y = rect.min_y.min(p.y);
        rect.max_x = rect.max_x.max(p.x);
        rect.max_y = rect.max_y.max(p.y);
    }
    Some(rect)
}

pub fn distance(p1: Point, p2: Point) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Distance from `p` to the closed segment `a`-`b`.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + t * dx, a.y + t * dy))
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn centerlines_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    // Collinear and touching cases are covered by the endpoint distances.
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Minimum distance between the centerlines of two segments (0 when they cross).
pub fn segment_distance(s1: &Segment, s2: &Segment) -> f64 {
    if centerlines_intersect(s1.start, s1.end, s2.start, s2.end) {
        return 0.0;
    }
    point_segment_distance(s1.start, s2.start, s2.end)
        .min(point_segment_distance(s1.end, s2.start, s2.end))
        .min(point_segment_distance(s2.start, s1.start, s1.end))
        .min(point_segment_distance(s2.end, s1.start, s1.end))
}

/// Minimum over the four endpoint pairs. Cheaper than [`segment_distance`]
/// but blind to offset or crossing segments.
pub fn endpoint_distance(s1: &Segment, s2: &Segment) -> f64 {
    [s1.start, s1.end]
        .iter()
        .flat_map(|a| [s2.start, s2.end].map(move |b| distance(*a, b)))
        .fold(f64::INFINITY, f64::min)
}

fn ranges_intersect(lo1: f64, hi1: f64, lo2: f64, hi2: f64) -> bool {
    lo1 <= hi2 && lo2 <= hi1
}

fn horizontal_crosses_vertical(h: &Segment, v: &Segment) -> bool {
    let (h_lo, h_hi) = h.x_range();
    let (v_lo, v_hi) = v.y_range();
    let vx = v.start.x;
    let hy = h.start.y;
    h_lo - v.half_width() <= vx
        && vx <= h_hi + v.half_width()
        && v_lo - h.half_width() <= hy
        && hy <= v_hi + h.half_width()
}

/// Whether the copper of two axis-aligned segments touches.
///
/// Diagonal segments are never reported; Manhattan routing is assumed.
pub fn segments_overlap(s1: &Segment, s2: &Segment) -> bool {
    let combined = s1.half_width() + s2.half_width();

    if s1.is_horizontal() && s2.is_horizontal() && (s1.start.y - s2.start.y).abs() < combined {
        let (lo1, hi1) = s1.x_range();
        let (lo2, hi2) = s2.x_range();
        if ranges_intersect(lo1, hi1, lo2, hi2) {
            return true;
        }
    }

    if s1.is_vertical() && s2.is_vertical() && (s1.start.x - s2.start.x).abs() < combined {
        let (lo1, hi1) = s1.y_range();
        let (lo2, hi2) = s2.y_range();
        if ranges_intersect(lo1, hi1, lo2, hi2) {
            return true;
        }
    }

    (s1.is_horizontal() && s2.is_vertical() && horizontal_crosses_vertical(s1, s2))
        || (s2.is_horizontal() && s1.is_vertical() && horizontal_crosses_vertical(s2, s1))
}

/// True if `p` lies strictly inside `rect` grown by `margin`.
pub fn point_in_rect(p: Point, rect: &Rect, margin: f64) -> bool {
    let r = rect.grow(margin);
    r.min_x < p.x && p.x < r.max_x && r.min_y < p.y && p.y < r.max_y
}

/// True if an axis-aligned segment runs through `rect` from one side to the other.
pub fn segment_crosses_rect(seg: &Segment, rect: &Rect, half_width: f64) -> bool {
    if seg.is_horizontal() {
        let y = seg.start.y;
        if rect.min_y - half_width <= y && y <= rect.max_y + half_width {
            let (lo, hi) = seg.x_range();
            return lo < rect.min_x - half_width && hi > rect.max_x + half_width;
        }
    } else if seg.is_vertical() {
        let x = seg.start.x;
        if rect.min_x - half_width <= x && x <= rect.max_x + half_width {
            let (lo, hi) = seg.y_range();
            return lo < rect.min_y - half_width && hi > rect.max_y + half_width;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2), width, "F.Cu", 1)
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_below_ignores_float_noise() {
        let ring = (0.56 - 0.3) / 2.0;
        assert!(!below(ring, 0.13));
        assert!(below(0.1, 0.13));
        assert!(!below(0.09, 0.09));
    }

    #[test]
    fn test_segment_distance_parallel() {
        let a = seg(0.0, 0.0, 10.0, 0.0, 0.2);
        let b = seg(0.0, 1.0, 10.0, 1.0, 0.2);
        assert!((segment_distance(&a, &b) - 1.0).abs() < 1e-12);
        assert!((endpoint_distance(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_distance_sees_offset_runs() {
        // Endpoints are far apart but the runs pass 0.5mm from each other.
        let a = seg(0.0, 0.0, 10.0, 0.0, 0.2);
        let b = seg(5.0, 0.5, 5.0, 20.0, 0.2);
        assert!((segment_distance(&a, &b) - 0.5).abs() < 1e-12);
        assert!(endpoint_distance(&a, &b) > 5.0);
    }

    #[test]
    fn test_segment_distance_crossing_is_zero() {
        let a = seg(0.0, 0.0, 10.0, 10.0, 0.2);
        let b = seg(0.0, 10.0, 10.0, 0.0, 0.2);
        assert_eq!(segment_distance(&a, &b), 0.0);
    }

    #[test]
    fn test_overlap_collinear_horizontal() {
        let a = seg(0.0, 0.0, 10.0, 0.0, 0.2);
        let b = seg(5.0, 0.1, 15.0, 0.1, 0.2);
        assert!(segments_overlap(&a, &b));

        let far = seg(5.0, 0.5, 15.0, 0.5, 0.2);
        assert!(!segments_overlap(&a, &far));
    }

    #[test]
    fn test_overlap_shared_endpoint() {
        let a = seg(0.0, 0.0, 10.0, 0.0, 0.2);
        let b = seg(10.0, 0.0, 20.0, 0.0, 0.2);
        assert!(segments_overlap(&a, &b));
        let c = seg(10.0, 0.0, 10.0, 10.0, 0.2);
        assert!(segments_overlap(&a, &c));
    }

    #[test]
    fn test_overlap_orthogonal_crossing_is_symmetric() {
        let h = seg(0.0, 5.0, 10.0, 5.0, 0.25);
        let v = seg(5.0, 0.0, 5.0, 10.0, 0.25);
        assert!(segments_overlap(&h, &v));
        assert!(segments_overlap(&v, &h));

        let miss = seg(12.0, 0.0, 12.0, 10.0, 0.25);
        assert!(!segments_overlap(&h, &miss));
        assert!(!segments_overlap(&miss, &h));
    }

    #[test]
    fn test_diagonal_segments_never_overlap() {
        let a = seg(0.0, 0.0, 10.0, 10.0, 0.2);
        let b = seg(0.0, 10.0, 10.0, 0.0, 0.2);
        assert!(!segments_overlap(&a, &b));
    }

    #[test]
    fn test_point_in_rect_with_margin() {
        let rect = Rect::new(125.5, 23.5, 128.5, 47.5);
        assert!(point_in_rect(Point::new(127.0, 30.0), &rect, 0.0));
        assert!(point_in_rect(Point::new(125.3, 30.0), &rect, 0.3));
        assert!(!point_in_rect(Point::new(125.0, 30.0), &rect, 0.3));
    }

    #[test]
    fn test_segment_crosses_rect() {
        let rect = Rect::new(125.5, 23.5, 128.5, 47.5);
        assert!(segment_crosses_rect(&seg(120.0, 30.0, 130.0, 30.0, 0.2), &rect, 0.1));
        assert!(!segment_crosses_rect(&seg(120.0, 30.0, 127.0, 30.0, 0.2), &rect, 0.1));
        assert!(!segment_crosses_rect(&seg(120.0, 50.0, 130.0, 50.0, 0.2), &rect, 0.1));
        assert!(segment_crosses_rect(&seg(127.0, 20.0, 127.0, 50.0, 0.2), &rect, 0.1));
    }

    #[test]
    fn test_rect_intersects_and_encloses() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(a.encloses(&Rect::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.encloses(&a));
    }

    #[test]
    fn test_bounding_box() {
        let bb = bounding_box([Point::new(3.0, 1.0), Point::new(-1.0, 4.0)]).unwrap();
        assert_eq!(bb, Rect::new(-1.0, 1.0, 3.0, 4.0));
        assert!(bounding_box(Vec::new()).is_none());
    }

    #[test]
    fn test_rotation() {
        let p = Point::new(1.0, 0.0).rotated(90.0);
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y + 1.0).abs() < 1e-12);
    }
}

//! Fabrication-house constraints: trace and via geometry, edge keep-outs,
//! copper-to-copper and hole-to-hole spacing.

use crate::config::{RuleConfig, SpacingMetric};
use crate::geometry::{
    below, distance, endpoint_distance, point_in_rect, segment_crosses_rect, segment_distance,
    Point, Rect,
};
use crate::model::{Board, Segment};
use crate::violation::{CappedCollector, CheckId, CheckOutcome, Violation};

pub fn check_trace_width(board: &Board, config: &RuleConfig) -> Vec<Violation> {
    let min = config.min_trace_width;
    board
        .segments
        .iter()
        .filter(|seg| below(seg.width, min))
        .map(|seg| {
            Violation::new(
                CheckId::TraceWidth,
                format!(
                    "Trace width {}mm < {}mm at {} on {}",
                    seg.width,
                    min,
                    seg.describe(),
                    seg.layer
                ),
            )
            .at(seg.start)
            .on_layer(&seg.layer)
            .with_items([seg.uuid.as_str()])
        })
        .collect()
}

/// Drill diameter, pad diameter and annular ring of every via. A via can
/// produce up to three independent violations.
pub fn check_via_dimensions(board: &Board, config: &RuleConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for via in &board.vias {
        let at = via.position;
        let violation = |message: String| {
            Violation::new(CheckId::ViaDimensions, message)
                .at(at)
                .with_items([via.uuid.as_str()])
        };

        if below(via.drill, config.min_via_drill) {
            violations.push(violation(format!(
                "Via drill {}mm < {}mm at {}",
                via.drill, config.min_via_drill, at
            )));
        }
        if below(via.size, config.min_via_pad) {
            violations.push(violation(format!(
                "Via pad {}mm < {}mm at {}",
                via.size, config.min_via_pad, at
            )));
        }
        let ring = via.annular_ring();
        if below(ring, config.min_annular_ring) {
            violations.push(violation(format!(
                "Via annular ring {:.3}mm < {}mm at {}",
                ring, config.min_annular_ring, at
            )));
        }
    }

    violations
}

/// A round feature of radius `reach` centered on `p` comes closer than
/// `margin` to the outline.
fn near_outline(p: Point, reach: f64, outline: &Rect, margin: f64) -> bool {
    below(p.x - reach, outline.min_x + margin)
        || below(outline.max_x - margin, p.x + reach)
        || below(p.y - reach, outline.min_y + margin)
        || below(outline.max_y - margin, p.y + reach)
}

pub fn check_board_edge_clearance(board: &Board, config: &RuleConfig) -> Vec<Violation> {
    let outline = config.outline();
    let margin = config.min_board_edge_clearance;
    let mut violations = Vec::new();
    let violation = |message: String, at: Point, uuid: &str| {
        Violation::new(CheckId::BoardEdgeClearance, message)
            .at(at)
            .with_items([uuid])
    };

    for seg in &board.segments {
        let hw = seg.half_width();
        for p in [seg.start, seg.end] {
            if near_outline(p, hw, &outline, margin) {
                violations.push(
                    violation(
                        format!("Trace at {} too close to board edge (margin={}mm)", p, margin),
                        p,
                        &seg.uuid,
                    )
                    .on_layer(&seg.layer),
                );
            }
            for cutout in &config.cutouts {
                if point_in_rect(p, &cutout.rect, margin + hw) {
                    violations.push(
                        violation(
                            format!("Trace at {} too close to cutout {}", p, cutout.name),
                            p,
                            &seg.uuid,
                        )
                        .on_layer(&seg.layer),
                    );
                }
            }
        }
        for cutout in &config.cutouts {
            if segment_crosses_rect(seg, &cutout.rect, hw) {
                violations.push(
                    violation(
                        format!("Trace {} crosses cutout {}", seg.describe(), cutout.name),
                        seg.start,
                        &seg.uuid,
                    )
                    .on_layer(&seg.layer),
                );
            }
        }
    }

    for via in &board.vias {
        let p = via.position;
        if near_outline(p, via.radius(), &outline, margin) {
            violations.push(violation(
                format!("Via at {} too close to board edge", p),
                p,
                &via.uuid,
            ));
        }
        for cutout in &config.cutouts {
            if point_in_rect(p, &cutout.rect, margin + via.radius()) {
                violations.push(violation(
                    format!("Via at {} too close to cutout {}", p, cutout.name),
                    p,
                    &via.uuid,
                ));
            }
        }
    }

    let drill_margin = config.min_drill_to_edge;
    for fp in &board.footprints {
        for pad in fp.pads.iter().filter(|p| p.is_drilled()) {
            let p = pad.position;
            let r = pad.drill / 2.0;
            let item = format!("{}.{}", fp.reference, pad.number);
            if near_outline(p, r, &outline, drill_margin) {
                violations.push(violation(
                    format!("Pad drill at {} too close to board edge", p),
                    p,
                    &item,
                ));
            }
            for cutout in &config.cutouts {
                if point_in_rect(p, &cutout.rect, drill_margin + r) {
                    violations.push(violation(
                        format!("Pad drill at {} too close to cutout {}", p, cutout.name),
                        p,
                        &item,
                    ));
                }
            }
        }
    }

    violations
}

fn spacing_distance(metric: SpacingMetric, s1: &Segment, s2: &Segment) -> f64 {
    match metric {
        SpacingMetric::Exact => segment_distance(s1, s2),
        SpacingMetric::Endpoints => endpoint_distance(s1, s2),
    }
}

/// Bounding boxes further apart than `reach` cannot produce a violation.
fn out_of_reach(s1: &Segment, s2: &Segment, reach: f64) -> bool {
    let (ax0, ax1) = s1.x_range();
    let (bx0, bx1) = s2.x_range();
    let (ay0, ay1) = s1.y_range();
    let (by0, by1) = s2.y_range();
    bx0 - ax1 > reach || ax0 - bx1 > reach || by0 - ay1 > reach || ay0 - by1 > reach
}

/// Copper gap between traces of different nets on one layer.
///
/// Pairs that touch (clearance <= 0) are left to the short detector; pairs
/// sharing a nonzero net are exempt. Enumeration stops at
/// `spacing_report_limit`.
pub fn check_trace_spacing(board: &Board, config: &RuleConfig) -> CheckOutcome {
    let min = config.min_trace_spacing;
    let mut collector = CappedCollector::new(CheckId::TraceSpacing, config.spacing_report_limit);

    for (layer, segs) in board.segments_by_layer() {
        for (i, s1) in segs.iter().enumerate() {
            for s2 in &segs[i + 1..] {
                if s1.net == s2.net && s1.net != 0 {
                    continue;
                }
                let combined = s1.half_width() + s2.half_width();
                if out_of_reach(s1, s2, combined + min) {
                    continue;
                }
                let clearance = spacing_distance(config.spacing_metric, s1, s2) - combined;
                if clearance > 0.0 && below(clearance, min) {
                    let violation = Violation::new(
                        CheckId::TraceSpacing,
                        format!(
                            "Trace spacing {:.3}mm < {}mm on {} between nets {} and {}",
                            clearance, min, layer, s1.net, s2.net
                        ),
                    )
                    .at(s1.start)
                    .on_layer(layer)
                    .with_items([s1.uuid.as_str(), s2.uuid.as_str()]);
                    if !collector.push(violation) {
                        return collector.finish();
                    }
                }
            }
        }
    }

    collector.finish()
}

/// Edge-to-edge distance between via holes. Overlapping holes count too.
pub fn check_drill_spacing(board: &Board, config: &RuleConfig) -> Vec<Violation> {
    let min = config.min_drill_spacing;
    let mut violations = Vec::new();

    for (i, v1) in board.vias.iter().enumerate() {
        for v2 in &board.vias[i + 1..] {
            let clearance =
                distance(v1.position, v2.position) - v1.drill_radius() - v2.drill_radius();
            if below(clearance, min) {
                violations.push(
                    Violation::new(
                        CheckId::DrillSpacing,
                        format!(
                            "Via drill spacing {:.3}mm < {}mm between {} and {}",
                            clearance, min, v1.position, v2.position
                        ),
                    )
                    .at(v1.position)
                    .with_items([v1.uuid.as_str(), v2.uuid.as_str()]),
                );
            }
        }
    }

    violations
}

use fabguard::analyzer::check_trace_shorts;
use fabguard::drc::{check_board_edge_clearance, check_trace_spacing, check_via_dimensions};
use fabguard::geometry::{segments_overlap, Point};
use fabguard::model::{Board, Net, Segment, Via};
use fabguard::RuleConfig;
use proptest::prelude::*;

/// Axis-aligned segment on a 0.05mm grid, the way generated boards are routed.
fn manhattan_segment(net: u32) -> impl Strategy<Value = Segment> {
    (0u32..400, 0u32..300, 1u32..200, any::<bool>(), 2u32..8).prop_map(
        move |(x, y, len, horizontal, width)| {
            let start = Point::new(f64::from(x) * 0.05, f64::from(y) * 0.05);
            let delta = f64::from(len) * 0.05;
            let end = if horizontal {
                Point::new(start.x + delta, start.y)
            } else {
                Point::new(start.x, start.y + delta)
            };
            Segment::new(start, end, f64::from(width) * 0.05, "F.Cu", net)
        },
    )
}

fn board_of(segments: Vec<Segment>) -> Board {
    Board {
        nets: (1..=4)
            .map(|id| Net {
                id,
                name: format!("N{}", id),
            })
            .collect(),
        segments,
        ..Default::default()
    }
}

fn mixed_segments() -> impl Strategy<Value = Vec<Segment>> {
    prop::collection::vec(
        (1u32..=4).prop_flat_map(manhattan_segment),
        0..24,
    )
}

proptest! {
    /// Invariant: overlap does not depend on argument order.
    #[test]
    fn overlap_is_symmetric(a in manhattan_segment(1), b in manhattan_segment(2)) {
        prop_assert_eq!(segments_overlap(&a, &b), segments_overlap(&b, &a));
    }

    /// Invariant: each shorted pair is reported once, whatever the input order.
    #[test]
    fn shorts_independent_of_order(segments in mixed_segments()) {
        let config = RuleConfig { short_report_limit: 10_000, ..RuleConfig::default() };
        let forward = check_trace_shorts(&board_of(segments.clone()), &config);
        let mut reversed = segments.clone();
        reversed.reverse();
        let backward = check_trace_shorts(&board_of(reversed), &config);
        prop_assert_eq!(forward.violations.len(), backward.violations.len());

        let expected = segments
            .iter()
            .enumerate()
            .flat_map(|(i, a)| segments[i + 1..].iter().map(move |b| (a, b)))
            .filter(|(a, b)| a.net != b.net && segments_overlap(a, b))
            .count();
        prop_assert_eq!(forward.violations.len(), expected);
    }

    /// Invariant: copper of one nonzero net never shorts or crowds itself.
    #[test]
    fn same_net_never_flagged(segments in prop::collection::vec(manhattan_segment(3), 0..24)) {
        let board = board_of(segments);
        let config = RuleConfig::default();
        prop_assert!(check_trace_shorts(&board, &config).violations.is_empty());
        prop_assert!(check_trace_spacing(&board, &config).violations.is_empty());
    }

    /// Invariant: a via is flagged iff its drill or annular ring is under the minimum.
    #[test]
    fn via_flagged_iff_drill_or_ring_small(size in 45u32..120, drill in 5u32..80) {
        let size = f64::from(size) / 100.0;
        let drill = f64::from(drill) / 100.0;
        let config = RuleConfig::default();
        let board = Board {
            vias: vec![Via::new(Point::new(50.0, 50.0), size, drill, 0)],
            ..Default::default()
        };
        let ring = (size - drill) / 2.0;
        let expected = (drill < config.min_via_drill - 1e-9) || (ring < config.min_annular_ring - 1e-9);
        let flagged = check_via_dimensions(&board, &config)
            .iter()
            .any(|v| v.message.starts_with("Via drill") || v.message.starts_with("Via annular ring"));
        prop_assert_eq!(flagged, expected);
    }

    /// Invariant: an endpoint is flagged iff its copper reaches into the edge margin.
    #[test]
    fn edge_clearance_formula(x in 0u32..1600, y in 0u32..750, width in 1u32..10) {
        let config = RuleConfig { cutouts: vec![], ..RuleConfig::default() };
        let p = Point::new(f64::from(x) / 10.0, f64::from(y) / 10.0);
        let w = f64::from(width) / 10.0;
        let board = board_of(vec![Segment::new(p, p, w, "F.Cu", 1)]);
        let hw = w / 2.0;
        let m = config.min_board_edge_clearance;
        let eps = 1e-9;
        let expected = p.x - hw < m - eps
            || p.x + hw > config.board_width - m + eps
            || p.y - hw < m - eps
            || p.y + hw > config.board_height - m + eps;
        let violations = check_board_edge_clearance(&board, &config);
        // A zero-length segment reports the same point twice.
        prop_assert_eq!(violations.len(), if expected { 2 } else { 0 });
    }
}

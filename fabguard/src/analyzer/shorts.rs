//! Cross-net short detection.

use crate::config::RuleConfig;
use crate::geometry::segments_overlap;
use crate::model::{Board, Segment};
use crate::violation::{CappedCollector, CheckId, CheckOutcome, Violation};

fn net_label(board: &Board, net: u32) -> String {
    board
        .net_name(net)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", net))
}

/// Two segments can only short when both carry a net and the nets differ.
fn distinct_nets(s1: &Segment, s2: &Segment) -> bool {
    s1.net != 0 && s2.net != 0 && s1.net != s2.net
}

/// Report every unordered pair of same-layer segments from different nets
/// whose copper touches, stopping at `short_report_limit`.
pub fn check_trace_shorts(board: &Board, config: &RuleConfig) -> CheckOutcome {
    let mut collector = CappedCollector::new(CheckId::TraceShorts, config.short_report_limit);

    for (layer, segs) in board.segments_by_layer() {
        for (i, s1) in segs.iter().enumerate() {
            for s2 in &segs[i + 1..] {
                if !distinct_nets(s1, s2) || !segments_overlap(s1, s2) {
                    continue;
                }
                let violation = Violation::new(
                    CheckId::TraceShorts,
                    format!(
                        "Trace short on {}: {} {} overlaps {} {}",
                        layer,
                        net_label(board, s1.net),
                        s1.describe(),
                        net_label(board, s2.net),
                        s2.describe()
                    ),
                )
                .at(s1.start)
                .on_layer(layer)
                .with_items([s1.uuid.as_str(), s2.uuid.as_str()]);
                if !collector.push(violation) {
                    tracing::debug!(layer, "short enumeration truncated");
                    return collector.finish();
                }
            }
        }
    }

    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::Net;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64, layer: &str, net: u32) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2), 0.25, layer, net)
    }

    fn board(segments: Vec<Segment>) -> Board {
        Board {
            nets: vec![
                Net {
                    id: 1,
                    name: "GND".to_string(),
                },
                Net {
                    id: 2,
                    name: "VBUS".to_string(),
                },
                Net {
                    id: 3,
                    name: "+3V3".to_string(),
                },
            ],
            segments,
            ..Default::default()
        }
    }

    #[test]
    fn test_crossing_short_reported_once() {
        let b = board(vec![
            seg(10.0, 20.0, 30.0, 20.0, "B.Cu", 1),
            seg(20.0, 10.0, 20.0, 30.0, "B.Cu", 2),
        ]);
        let outcome = check_trace_shorts(&b, &RuleConfig::default());
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(
            outcome.violations[0].message,
            "Trace short on B.Cu: GND (10,20)->(30,20) overlaps VBUS (20,10)->(20,30)"
        );
    }

    #[test]
    fn test_same_net_and_unconnected_never_short() {
        let b = board(vec![
            seg(10.0, 20.0, 30.0, 20.0, "F.Cu", 1),
            seg(20.0, 10.0, 20.0, 30.0, "F.Cu", 1),
            seg(15.0, 10.0, 15.0, 30.0, "F.Cu", 0),
        ]);
        assert!(check_trace_shorts(&b, &RuleConfig::default()).violations.is_empty());
    }

    #[test]
    fn test_different_layers_never_short() {
        let b = board(vec![
            seg(10.0, 20.0, 30.0, 20.0, "F.Cu", 1),
            seg(20.0, 10.0, 20.0, 30.0, "B.Cu", 2),
        ]);
        assert!(check_trace_shorts(&b, &RuleConfig::default()).violations.is_empty());
    }

    #[test]
    fn test_input_order_does_not_change_pair_set() {
        let a = seg(10.0, 20.0, 30.0, 20.0, "B.Cu", 1);
        let b = seg(20.0, 10.0, 20.0, 30.0, "B.Cu", 2);
        let forward = check_trace_shorts(&board(vec![a.clone(), b.clone()]), &RuleConfig::default());
        let reverse = check_trace_shorts(&board(vec![b, a]), &RuleConfig::default());
        assert_eq!(forward.violations.len(), 1);
        assert_eq!(reverse.violations.len(), 1);
    }

    #[test]
    fn test_undeclared_net_label() {
        let b = Board {
            segments: vec![
                seg(10.0, 20.0, 30.0, 20.0, "F.Cu", 7),
                seg(20.0, 10.0, 20.0, 30.0, "F.Cu", 8),
            ],
            ..Default::default()
        };
        let outcome = check_trace_shorts(&b, &RuleConfig::default());
        assert!(outcome.violations[0].message.contains("#7 (10,20)->(30,20) overlaps #8"));
    }

    #[test]
    fn test_truncation() {
        // Ten horizontal GND runs crossed by one VBUS column.
        let mut segments: Vec<Segment> = (0..10u32)
            .map(|i| {
                let y = 10.0 + f64::from(i);
                seg(0.0, y, 20.0, y, "F.Cu", 1)
            })
            .collect();
        segments.push(seg(10.0, 0.0, 10.0, 30.0, "F.Cu", 2));
        let config = RuleConfig {
            short_report_limit: 4,
            ..RuleConfig::default()
        };
        let outcome = check_trace_shorts(&board(segments), &config);
        assert_eq!(outcome.violations.len(), 4);
        assert!(outcome.truncated.is_some());
    }
}

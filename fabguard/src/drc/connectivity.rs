//! Connectivity warnings. Nothing here fails a run.

use std::collections::HashMap;

use crate::model::Board;
use crate::violation::{CheckId, Violation};

/// Warn about declared nets routed by fewer than two segments.
pub fn check_net_connectivity(board: &Board) -> Vec<Violation> {
    let mut usage: HashMap<u32, usize> = HashMap::new();
    for seg in board.segments.iter().filter(|s| s.net > 0) {
        *usage.entry(seg.net).or_default() += 1;
    }

    board
        .nets
        .iter()
        .filter_map(|net| {
            let message = match usage.get(&net.id).copied().unwrap_or(0) {
                0 => format!("Net {} \"{}\" has no traces", net.id, net.name),
                1 => format!("Net {} \"{}\" has only 1 trace segment", net.id, net.name),
                _ => return None,
            };
            Some(Violation::new(CheckId::NetConnectivity, message).with_items([net.name.as_str()]))
        })
        .collect()
}

/// Boards generated without pad net assignments only get them from KiCad's
/// zone fill; flag that state once instead of per pad.
pub fn check_pad_nets(board: &Board) -> Vec<Violation> {
    let total = board.pads().count();
    if total == 0 || board.pads().any(|p| p.net != 0) {
        return Vec::new();
    }
    vec![Violation::new(
        CheckId::PadNets,
        format!(
            "All {} pads have net 0; pad nets are not assigned until zones are filled",
            total
        ),
    )]
}

//! Zone consistency: fill order, fill presence, and the Gerbers that should
//! carry the fills.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::{FillArtifact, RuleConfig};
use crate::model::{Board, Zone};
use crate::violation::{CheckId, Violation};

/// Two zones may share a priority only when their outlines cannot overlap.
fn may_overlap(a: &Zone, b: &Zone) -> bool {
    match (a.bounding_box(), b.bounding_box()) {
        (Some(ra), Some(rb)) => ra.intersects(&rb),
        _ => true,
    }
}

/// Zones sharing a layer need explicit, distinct priorities or the fill
/// order is undefined.
pub fn check_zone_priorities(board: &Board) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (layer, zones) in board.zones_by_layer() {
        if zones.len() <= 1 {
            continue;
        }

        for zone in zones.iter().filter(|z| z.priority.is_none()) {
            violations.push(
                Violation::new(
                    CheckId::ZonePriorities,
                    format!(
                        "Zone {} on {} has no priority; overlapping zones will conflict",
                        zone.net_name, layer
                    ),
                )
                .on_layer(layer)
                .with_items([zone.uuid.as_str()]),
            );
        }

        for (i, a) in zones.iter().enumerate() {
            let Some(priority) = a.priority else { continue };
            for b in &zones[i + 1..] {
                if b.priority != Some(priority) || !may_overlap(a, b) {
                    continue;
                }
                violations.push(
                    Violation::new(
                        CheckId::ZonePriorities,
                        format!(
                            "Zones {} and {} on {} both have priority {}",
                            a.net_name, b.net_name, layer, priority
                        ),
                    )
                    .on_layer(layer)
                    .with_items([a.uuid.as_str(), b.uuid.as_str()]),
                );
            }
        }
    }

    violations
}

pub fn check_zone_fill(board: &Board) -> Vec<Violation> {
    if board.zones.is_empty() || board.zones.iter().any(|z| z.filled) {
        return Vec::new();
    }
    vec![Violation::new(
        CheckId::ZoneFill,
        format!(
            "{} zones defined but none has filled polygons; fill zones before exporting Gerbers",
            board.zones.len()
        ),
    )]
}

/// KiCad's Protel-style Gerber name for a copper layer, or `None` for
/// non-copper layers.
pub fn gerber_file_name(stem: &str, layer: &str) -> Option<String> {
    let name = layer.strip_suffix(".Cu")?;
    let extension = match name {
        "F" => "gtl".to_string(),
        "B" => "gbl".to_string(),
        inner => {
            let n: u32 = inner.strip_prefix("In")?.parse().ok()?;
            format!("g{}", n)
        }
    };
    Some(format!("{}-{}_Cu.{}", stem, name, extension))
}

/// Gerbers expected to hold zone fills: the configured list, or one file per
/// copper layer that carries a zone.
pub fn expected_artifacts(board: &Board, config: &RuleConfig, stem: &str) -> Vec<FillArtifact> {
    if !config.fill_artifacts.is_empty() {
        return config.fill_artifacts.clone();
    }

    board
        .zones_by_layer()
        .into_iter()
        .filter_map(|(layer, zones)| {
            let file_name = gerber_file_name(stem, layer)?;
            let nets: BTreeSet<&str> = zones.iter().map(|z| z.net_name.as_str()).collect();
            let nets: Vec<&str> = nets.into_iter().collect();
            Some(FillArtifact {
                file_name,
                description: format!("{} planes ({})", nets.join("/"), layer),
            })
        })
        .collect()
}

/// File stem of the board, used to name its Gerbers.
pub fn board_stem(board: &Board) -> String {
    Path::new(&board.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("board")
        .to_string()
}

/// Probe the exported Gerbers in `dir`. A missing directory yields a single
/// violation; otherwise every expected file is checked for presence and size.
pub fn check_fill_artifacts(board: &Board, config: &RuleConfig, dir: &Path) -> Vec<Violation> {
    let expected = expected_artifacts(board, config, &board_stem(board));
    if expected.is_empty() {
        return Vec::new();
    }

    if !dir.is_dir() {
        return vec![Violation::new(
            CheckId::FillArtifacts,
            format!("Gerber directory {} not found; export Gerbers first", dir.display()),
        )];
    }

    let min = config.min_fill_artifact_bytes;
    let mut violations = Vec::new();
    for artifact in &expected {
        let path = dir.join(&artifact.file_name);
        let size = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                violations.push(
                    Violation::new(
                        CheckId::FillArtifacts,
                        format!("Gerber {} ({}) not found", artifact.file_name, artifact.description),
                    )
                    .with_items([artifact.file_name.as_str()]),
                );
                continue;
            }
        };
        tracing::debug!(file = %path.display(), size, "probed fill artifact");
        if size < min {
            violations.push(
                Violation::new(
                    CheckId::FillArtifacts,
                    format!(
                        "Gerber {} ({}) is only {} bytes; zone fill is likely missing (expected at least {}B)",
                        artifact.file_name, artifact.description, size, min
                    ),
                )
                .with_items([artifact.file_name.as_str()]),
            );
        }
    }
    violations
}

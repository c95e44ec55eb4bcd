//! Check registry and runner.
//!
//! Checks share nothing but read-only borrows of the board and rule set, so
//! the engine fans them out over rayon's pool. Results come back in
//! registration order regardless of which thread finished first.

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

use crate::analyzer::{
    check_fill_artifacts, check_trace_shorts, check_zone_fill, check_zone_priorities,
};
use crate::config::RuleConfig;
use crate::drc::{
    check_board_edge_clearance, check_component_overlap, check_drill_spacing,
    check_net_connectivity, check_pad_nets, check_trace_spacing, check_trace_width,
    check_via_dimensions, PlacementList,
};
use crate::model::Board;
use crate::report::CheckResult;
use crate::violation::{CheckId, CheckOutcome, Severity};

/// Everything a check may read.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub board: &'a Board,
    pub config: &'a RuleConfig,
    /// External placement list; derived from the board's footprints when absent.
    pub placements: Option<&'a PlacementList>,
    /// Directory holding exported Gerbers.
    pub artifact_dir: Option<&'a Path>,
}

impl<'a> CheckContext<'a> {
    pub fn new(board: &'a Board, config: &'a RuleConfig) -> Self {
        Self {
            board,
            config,
            placements: None,
            artifact_dir: None,
        }
    }

    pub fn with_placements(mut self, placements: &'a PlacementList) -> Self {
        self.placements = Some(placements);
        self
    }

    pub fn with_artifact_dir(mut self, dir: &'a Path) -> Self {
        self.artifact_dir = Some(dir);
        self
    }
}

pub trait Check: Send + Sync {
    fn id(&self) -> CheckId;

    fn name(&self) -> &str {
        self.id().title()
    }

    fn severity(&self) -> Severity {
        self.id().severity()
    }

    /// `None` when an input the check depends on was not supplied.
    fn run(&self, ctx: &CheckContext<'_>) -> Option<CheckOutcome>;
}

/// One of the checks shipped with the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCheck(pub CheckId);

impl Check for BuiltinCheck {
    fn id(&self) -> CheckId {
        self.0
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Option<CheckOutcome> {
        let board = ctx.board;
        let config = ctx.config;
        let outcome: CheckOutcome = match self.0 {
            CheckId::TraceWidth => check_trace_width(board, config).into(),
            CheckId::ViaDimensions => check_via_dimensions(board, config).into(),
            CheckId::BoardEdgeClearance => check_board_edge_clearance(board, config).into(),
            CheckId::TraceSpacing => check_trace_spacing(board, config),
            CheckId::DrillSpacing => check_drill_spacing(board, config).into(),
            CheckId::ComponentOverlap => match ctx.placements {
                Some(list) => check_component_overlap(list, config).into(),
                None => check_component_overlap(&PlacementList::from_board(board), config).into(),
            },
            CheckId::TraceShorts => check_trace_shorts(board, config),
            CheckId::ZonePriorities => check_zone_priorities(board).into(),
            CheckId::ZoneFill => check_zone_fill(board).into(),
            CheckId::FillArtifacts => check_fill_artifacts(board, config, ctx.artifact_dir?).into(),
            CheckId::NetConnectivity => check_net_connectivity(board).into(),
            CheckId::PadNets => check_pad_nets(board).into(),
        };
        Some(outcome)
    }
}

pub struct CheckEngine {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckEngine {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn with_default_checks() -> Self {
        let mut engine = Self::new();
        for id in CheckId::ALL {
            engine.add_check(Arc::new(BuiltinCheck(id)));
        }
        engine
    }

    /// Default checks restricted to `ids`, in their default order.
    pub fn with_checks(ids: &[CheckId]) -> Self {
        let mut engine = Self::new();
        for id in CheckId::ALL.into_iter().filter(|id| ids.contains(id)) {
            engine.add_check(Arc::new(BuiltinCheck(id)));
        }
        engine
    }

    pub fn add_check(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn run(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
        self.checks
            .par_iter()
            .map(|check| {
                let result = match check.run(ctx) {
                    Some(outcome) => CheckResult::from_outcome(check.as_ref(), outcome),
                    None => CheckResult::skipped(check.as_ref()),
                };
                tracing::debug!(
                    check = %check.id(),
                    violations = result.violations.len(),
                    skipped = result.skipped,
                    "check finished"
                );
                result
            })
            .collect()
    }
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Net, Segment};
    use crate::violation::Violation;

    struct AlwaysFails;

    impl Check for AlwaysFails {
        fn id(&self) -> CheckId {
            CheckId::TraceWidth
        }

        fn name(&self) -> &str {
            "Always Fails"
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> Option<CheckOutcome> {
            Some(vec![Violation::new(CheckId::TraceWidth, "nope")].into())
        }
    }

    fn board() -> Board {
        Board {
            nets: vec![Net {
                id: 1,
                name: "GND".to_string(),
            }],
            segments: vec![Segment::new(
                Point::new(10.0, 10.0),
                Point::new(20.0, 10.0),
                0.05,
                "F.Cu",
                1,
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_results_follow_registration_order() {
        let board = board();
        let config = RuleConfig::default();
        let engine = CheckEngine::with_default_checks();
        let results = engine.run(&CheckContext::new(&board, &config));
        let ids: Vec<_> = results.iter().map(|r| r.check).collect();
        assert_eq!(ids, CheckId::ALL.to_vec());
    }

    #[test]
    fn test_fill_artifacts_skipped_without_directory() {
        let board = board();
        let config = RuleConfig::default();
        let results =
            CheckEngine::with_checks(&[CheckId::FillArtifacts]).run(&CheckContext::new(&board, &config));
        assert_eq!(results.len(), 1);
        assert!(results[0].skipped);
    }

    #[test]
    fn test_custom_check() {
        let board = board();
        let config = RuleConfig::default();
        let mut engine = CheckEngine::new();
        engine.add_check(Arc::new(AlwaysFails));
        let results = engine.run(&CheckContext::new(&board, &config));
        assert_eq!(results[0].name, "Always Fails");
        assert_eq!(results[0].violations.len(), 1);
    }

    #[test]
    fn test_with_checks_keeps_default_order() {
        let engine = CheckEngine::with_checks(&[CheckId::TraceShorts, CheckId::TraceWidth]);
        let ids: Vec<_> = engine.checks().map(|c| c.id()).collect();
        assert_eq!(ids, vec![CheckId::TraceWidth, CheckId::TraceShorts]);
    }
}

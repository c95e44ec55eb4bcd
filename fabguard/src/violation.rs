//! Check identifiers, severities and the violations checks report.
//!
//! Capped checks stop collecting at `RuleConfig` limits and return a
//! [`TruncationNotice`] next to their violations; notices are never counted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run.
    Error,
    /// Reported, never fails the run.
    Warning,
}

/// Identity of every check the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    TraceWidth,
    ViaDimensions,
    BoardEdgeClearance,
    TraceSpacing,
    DrillSpacing,
    ComponentOverlap,
    TraceShorts,
    ZonePriorities,
    ZoneFill,
    FillArtifacts,
    NetConnectivity,
    PadNets,
}

impl CheckId {
    pub const ALL: [CheckId; 12] = [
        CheckId::TraceWidth,
        CheckId::ViaDimensions,
        CheckId::BoardEdgeClearance,
        CheckId::TraceSpacing,
        CheckId::DrillSpacing,
        CheckId::ComponentOverlap,
        CheckId::TraceShorts,
        CheckId::ZonePriorities,
        CheckId::ZoneFill,
        CheckId::FillArtifacts,
        CheckId::NetConnectivity,
        CheckId::PadNets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckId::TraceWidth => "trace_width",
            CheckId::ViaDimensions => "via_dimensions",
            CheckId::BoardEdgeClearance => "board_edge_clearance",
            CheckId::TraceSpacing => "trace_spacing",
            CheckId::DrillSpacing => "drill_spacing",
            CheckId::ComponentOverlap => "component_overlap",
            CheckId::TraceShorts => "trace_shorts",
            CheckId::ZonePriorities => "zone_priorities",
            CheckId::ZoneFill => "zone_fill",
            CheckId::FillArtifacts => "fill_artifacts",
            CheckId::NetConnectivity => "net_connectivity",
            CheckId::PadNets => "pad_nets",
        }
    }

    /// Human-readable name used in reports.
    pub fn title(&self) -> &'static str {
        match self {
            CheckId::TraceWidth => "Trace Width",
            CheckId::ViaDimensions => "Via Dimensions",
            CheckId::BoardEdgeClearance => "Board Edge Clearance",
            CheckId::TraceSpacing => "Trace Spacing",
            CheckId::DrillSpacing => "Drill Spacing",
            CheckId::ComponentOverlap => "Component Overlap",
            CheckId::TraceShorts => "Trace Shorts",
            CheckId::ZonePriorities => "Zone Priorities",
            CheckId::ZoneFill => "Zone Fill Data",
            CheckId::FillArtifacts => "Fill Artifact Sizes",
            CheckId::NetConnectivity => "Net Connectivity",
            CheckId::PadNets => "Pad Net Assignments",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckId::TraceWidth => "Every trace is at least the fab's minimum width",
            CheckId::ViaDimensions => "Via drill, pad diameter and annular ring meet the minimums",
            CheckId::BoardEdgeClearance => {
                "Copper and drills keep clear of the board edge and internal cutouts"
            }
            CheckId::TraceSpacing => "Traces of different nets on one layer keep the minimum gap",
            CheckId::DrillSpacing => "Via holes keep the minimum edge-to-edge distance",
            CheckId::ComponentOverlap => {
                "Placed parts and mounting holes keep a minimum center distance"
            }
            CheckId::TraceShorts => "No copper of two different nets touches on the same layer",
            CheckId::ZonePriorities => "Zones sharing a layer have distinct, explicit priorities",
            CheckId::ZoneFill => "Declared zones carry filled polygon data",
            CheckId::FillArtifacts => "Copper-layer Gerbers for zone layers are not empty",
            CheckId::NetConnectivity => "Declared nets are routed by at least two segments",
            CheckId::PadNets => "Pads carry net assignments",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CheckId::NetConnectivity | CheckId::PadNets => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub check: CheckId,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// UUIDs or references of the elements involved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl Violation {
    pub fn new(check: CheckId, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: check.severity(),
            message: message.into(),
            location: None,
            layer: None,
            items: Vec::new(),
        }
    }

    pub fn at(mut self, location: Point) -> Self {
        self.location = Some(location);
        self
    }

    pub fn on_layer(mut self, layer: &str) -> Self {
        self.layer = Some(layer.to_string());
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into).filter(|s: &String| !s.is_empty()));
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Marks an enumeration that stopped at its report limit. Not a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncationNotice {
    pub check: CheckId,
    pub limit: usize,
}

impl fmt::Display for TruncationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "... (truncated after {} {} violations)",
            self.limit,
            self.check.title().to_lowercase()
        )
    }
}

/// Violations of one check plus an optional truncation marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub violations: Vec<Violation>,
    pub truncated: Option<TruncationNotice>,
}

impl From<Vec<Violation>> for CheckOutcome {
    fn from(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            truncated: None,
        }
    }
}

/// Collects violations up to a limit, then records a [`TruncationNotice`].
pub(crate) struct CappedCollector {
    check: CheckId,
    limit: usize,
    outcome: CheckOutcome,
}

impl CappedCollector {
    pub(crate) fn new(check: CheckId, limit: usize) -> Self {
        Self {
            check,
            limit,
            outcome: CheckOutcome::default(),
        }
    }

    /// Returns `false` once the limit is exceeded; callers stop enumerating.
    pub(crate) fn push(&mut self, violation: Violation) -> bool {
        if self.outcome.violations.len() >= self.limit {
            self.outcome.truncated = Some(TruncationNotice {
                check: self.check,
                limit: self.limit,
            });
            return false;
        }
        self.outcome.violations.push(violation);
        true
    }

    pub(crate) fn finish(self) -> CheckOutcome {
        self.outcome
    }
}

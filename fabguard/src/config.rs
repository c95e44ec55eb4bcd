//! Rule Configuration
//!
//! A fab house's manufacturing limits as one immutable value. Checks read
//! every threshold from here, so the same engine can judge a board against
//! several rule sets. Rule sets load from JSON; only the thresholds are
//! mandatory, everything else falls back to the defaults of
//! [`RuleConfig::jlcpcb_4layer`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::geometry::{Point, Rect};
use crate::model::{Board, Cutout};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid rule '{rule}': {reason}")]
    Invalid { rule: String, reason: String },
}

fn invalid(rule: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        rule: rule.to_string(),
        reason: reason.to_string(),
    }
}

/// Distance used when measuring trace-to-trace spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingMetric {
    /// True minimum distance between the two centerlines.
    #[default]
    Exact,
    /// Minimum over the four endpoint pairs only.
    Endpoints,
}

/// Gerber file expected to contain a zone fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillArtifact {
    pub file_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_name")]
    pub name: String,

    pub min_trace_width: f64,
    pub min_trace_spacing: f64,
    pub min_via_drill: f64,
    pub min_via_pad: f64,
    pub min_annular_ring: f64,
    pub min_board_edge_clearance: f64,
    pub min_drill_to_edge: f64,
    /// Edge-to-edge distance between drilled holes.
    pub min_drill_spacing: f64,

    pub board_width: f64,
    pub board_height: f64,
    #[serde(default)]
    pub board_origin: Point,
    #[serde(default)]
    pub cutouts: Vec<Cutout>,

    /// Center-to-center distance between placed components.
    #[serde(default = "default_component_spacing")]
    pub min_component_spacing: f64,
    #[serde(default)]
    pub spacing_metric: SpacingMetric,
    #[serde(default = "default_spacing_limit")]
    pub spacing_report_limit: usize,
    #[serde(default = "default_short_limit")]
    pub short_report_limit: usize,

    #[serde(default = "default_fill_bytes")]
    pub min_fill_artifact_bytes: u64,
    /// When empty, one Gerber per zone-bearing copper layer is expected.
    #[serde(default)]
    pub fill_artifacts: Vec<FillArtifact>,
}

fn default_name() -> String {
    "custom".to_string()
}

fn default_component_spacing() -> f64 {
    3.0
}

fn default_spacing_limit() -> usize {
    20
}

fn default_short_limit() -> usize {
    50
}

fn default_fill_bytes() -> u64 {
    5000
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::jlcpcb_4layer()
    }
}

impl RuleConfig {
    /// JLCPCB 4-layer capabilities for the 160 x 75 mm handheld board,
    /// including its FPC ribbon slot.
    pub fn jlcpcb_4layer() -> Self {
        Self {
            name: "JLCPCB 4-layer".to_string(),
            min_trace_width: 0.09,
            min_trace_spacing: 0.09,
            min_via_drill: 0.15,
            min_via_pad: 0.45,
            min_annular_ring: 0.13,
            min_board_edge_clearance: 0.3,
            min_drill_to_edge: 0.4,
            min_drill_spacing: 0.5,
            board_width: 160.0,
            board_height: 75.0,
            board_origin: Point::default(),
            cutouts: vec![Cutout::new("FPC slot", Rect::new(125.5, 23.5, 128.5, 47.5))],
            min_component_spacing: default_component_spacing(),
            spacing_metric: SpacingMetric::Exact,
            spacing_report_limit: default_spacing_limit(),
            short_report_limit: default_short_limit(),
            min_fill_artifact_bytes: default_fill_bytes(),
            fill_artifacts: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RuleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::info!(rules = %config.name, file = %path.display(), "loaded rule set");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("min_trace_width", self.min_trace_width),
            ("min_trace_spacing", self.min_trace_spacing),
            ("min_via_drill", self.min_via_drill),
            ("min_via_pad", self.min_via_pad),
            ("min_annular_ring", self.min_annular_ring),
            ("min_board_edge_clearance", self.min_board_edge_clearance),
            ("min_drill_to_edge", self.min_drill_to_edge),
            ("min_drill_spacing", self.min_drill_spacing),
            ("min_component_spacing", self.min_component_spacing),
        ];
        for (rule, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(rule, "must be a finite, non-negative length in mm"));
            }
        }

        for (rule, value) in [("board_width", self.board_width), ("board_height", self.board_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(rule, "must be positive"));
            }
        }

        if let Some(cutout) = self.cutouts.iter().find(|c| !c.rect.is_valid()) {
            return Err(invalid(
                &format!("cutouts.{}", cutout.name),
                "rectangle must have positive width and height",
            ));
        }

        if self.spacing_report_limit == 0 {
            return Err(invalid("spacing_report_limit", "must be at least 1"));
        }
        if self.short_report_limit == 0 {
            return Err(invalid("short_report_limit", "must be at least 1"));
        }
        Ok(())
    }

    /// Board outline as a rectangle in board coordinates.
    pub fn outline(&self) -> Rect {
        Rect::new(
            self.board_origin.x,
            self.board_origin.y,
            self.board_origin.x + self.board_width,
            self.board_origin.y + self.board_height,
        )
    }

    /// Copy of this rule set whose outline and cutouts come from the board's
    /// own `Edge.Cuts` layer. Unchanged when the board draws no outline; the
    /// configured cutouts stay when the board draws none.
    pub fn with_board_outline(&self, board: &Board) -> Self {
        let mut config = self.clone();
        if let Some(outline) = board.outline {
            config.board_origin = Point::new(outline.min_x, outline.min_y);
            config.board_width = outline.width();
            config.board_height = outline.height();
            if !board.cutouts.is_empty() {
                config.cutouts = board.cutouts.clone();
            }
        }
        config
    }
}

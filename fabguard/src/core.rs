//! Verification entry points shared by the CLI and library users.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, RuleConfig};
use crate::drc::{PlacementError, PlacementList};
use crate::engine::{CheckContext, CheckEngine};
use crate::model::Board;
use crate::parser::{BoardParseError, BoardParser};
use crate::report::Report;
use crate::violation::CheckId;

#[derive(Debug, thiserror::Error)]
pub enum FabGuardError {
    #[error("Parse error: {0}")]
    Parse(#[from] BoardParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),
}

/// Options for a verification run.
#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    pub rules: RuleConfig,
    pub placements: Option<PlacementList>,
    /// Directory holding exported Gerbers; fill artifacts are only probed when set.
    pub artifact_dir: Option<PathBuf>,
    /// Take the outline and cutouts from the board's `Edge.Cuts` instead of the rule set.
    pub use_board_outline: bool,
    /// Restrict the run to these checks. Empty means every check.
    pub checks: Vec<CheckId>,
}

impl VerifyOptions {
    pub fn with_rules(rules: RuleConfig) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }
}

pub struct FabGuardCore;

impl FabGuardCore {
    /// Parse a board file and run the selected checks.
    pub fn verify_file(path: &Path, options: &VerifyOptions) -> Result<Report, FabGuardError> {
        let board = BoardParser::parse_file(path)?;
        Ok(Self::verify_board(&board, options))
    }

    pub fn verify_str(
        content: &str,
        filename: &str,
        options: &VerifyOptions,
    ) -> Result<Report, FabGuardError> {
        let board = BoardParser::parse_str(content, filename)?;
        Ok(Self::verify_board(&board, options))
    }

    /// Run the checks against an already parsed board. Never fails: once a
    /// board exists every check runs to completion.
    pub fn verify_board(board: &Board, options: &VerifyOptions) -> Report {
        let config = if options.use_board_outline {
            options.rules.with_board_outline(board)
        } else {
            options.rules.clone()
        };

        let engine = if options.checks.is_empty() {
            CheckEngine::with_default_checks()
        } else {
            CheckEngine::with_checks(&options.checks)
        };

        let mut ctx = CheckContext::new(board, &config);
        if let Some(placements) = &options.placements {
            ctx = ctx.with_placements(placements);
        }
        if let Some(dir) = &options.artifact_dir {
            ctx = ctx.with_artifact_dir(dir);
        }

        let report = Report::new(board, &config, engine.run(&ctx));
        tracing::info!(
            file = %report.file,
            rules = %report.rules,
            errors = report.error_count,
            warnings = report.warning_count,
            passed = report.passed,
            "verification finished"
        );
        report
    }
}

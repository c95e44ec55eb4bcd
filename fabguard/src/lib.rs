//! FabGuard - manufacturability and short-circuit verification for KiCad boards
//!
//! This library reads a routed `.kicad_pcb` file and judges it against a fab
//! house's limits (trace width and spacing, via and drill geometry, board edge
//! and cutout keep-outs) and against electrical sanity checks (cross-net
//! shorts, copper-pour priorities and fills, net connectivity).
//!
//! # Quick Start
//!
//! ```no_run
//! use fabguard::{FabGuardCore, VerifyOptions};
//! use std::path::Path;
//!
//! let report = FabGuardCore::verify_file(
//!     Path::new("hardware/kicad/board.kicad_pcb"),
//!     &VerifyOptions::default(),
//! ).unwrap();
//!
//! for error in report.errors() {
//!     println!("{}", error);
//! }
//! std::process::exit(report.exit_code());
//! ```
//!
//! # Features
//!
//! - **Fabrication rules**: trace width/spacing, via drill/pad/annular ring,
//!   edge and cutout clearance, drill spacing, component spacing
//! - **Electrical analysis**: trace shorts, zone priorities, zone fills,
//!   Gerber fill artifacts
//! - **Rule sets**: JLCPCB 4-layer preset or any JSON rule file
//! - **Reports**: per-check results, JSON serialization, CI exit codes

pub mod analyzer;
pub mod config;
pub mod core;
pub mod drc;
pub mod engine;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod report;
pub mod violation;

// Re-export main types
pub use crate::core::{FabGuardCore, FabGuardError, VerifyOptions};
pub use config::{ConfigError, RuleConfig, SpacingMetric};
pub use drc::{PlacementError, PlacementList};
pub use engine::{Check, CheckContext, CheckEngine};
pub use model::Board;
pub use parser::BoardParser;
pub use report::{CheckResult, Report};
pub use violation::{CheckId, Severity, TruncationNotice, Violation};

/// Parse a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, FabGuardError> {
    Ok(BoardParser::parse_file(path)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, CheckId, FabGuardCore, FabGuardError, Report, RuleConfig, Severity, VerifyOptions,
        Violation,
    };
}

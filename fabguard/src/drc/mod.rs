//! Design rule checks against fab-house limits.
//!
//! Every check is a pure function of the board and a [`RuleConfig`](crate::config::RuleConfig);
//! none of them mutates its inputs or depends on another check's result.

pub mod connectivity;
pub mod fabrication;
pub mod placement;

pub use connectivity::{check_net_connectivity, check_pad_nets};
pub use fabrication::{
    check_board_edge_clearance, check_drill_spacing, check_trace_spacing, check_trace_width,
    check_via_dimensions,
};
pub use placement::{check_component_overlap, PlacementError, PlacementList};

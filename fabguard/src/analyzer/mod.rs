//! Electrical-integrity analysis: cross-net shorts and copper-pour consistency.

pub mod shorts;
pub mod zones;

pub use shorts::check_trace_shorts;
pub use zones::{
    board_stem, check_fill_artifacts, check_zone_fill, check_zone_priorities, expected_artifacts,
};

//! Client-side cost estimation for translation operations.
//!
//! Costs are in Toman per started minute of video. The backend computes
//! the authoritative price on `POST /translate/start`; these functions
//! drive the preview shown before submitting.

mod cost;
mod format;
mod resolution;

pub use cost::{
    CostEstimate, DEFAULT_BASE_CREDITS, TOMAN_PER_CREDIT, base_credits, base_credits_for,
    estimate_cost, estimate_duration_from_size, operation_cost, operation_cost_for,
};
pub use format::{format_duration, format_file_size};
pub use resolution::{DEFAULT_HEIGHT, QualityTier, parse_height, quality_multiplier};

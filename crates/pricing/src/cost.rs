use dubhub_protocol::OperationType;
use serde::{Deserialize, Serialize};

use crate::resolution::{parse_height, quality_multiplier};

/// Base credits per minute for identifiers the client does not know.
pub const DEFAULT_BASE_CREDITS: u32 = 3;

/// One credit is worth this many Toman.
pub const TOMAN_PER_CREDIT: f64 = 1000.0;

/// Base credits per minute at 720p or below.
pub fn base_credits(op: OperationType) -> u32 {
    match op {
        OperationType::EnglishSubtitle => 3,
        OperationType::PersianSubtitle => 4,
        OperationType::PersianDubbing => 5,
        OperationType::PersianDubbingEnglishSubtitle
        | OperationType::PersianDubbingPersianSubtitle => 6,
    }
}

/// Like [`base_credits`] but for a raw identifier.
pub fn base_credits_for(id: &str) -> u32 {
    id.parse().map_or(DEFAULT_BASE_CREDITS, base_credits)
}

/// Cost per minute in Toman: `ceil(base * multiplier * 1000)`.
pub fn operation_cost(op: OperationType, resolution: &str) -> u64 {
    cost_per_minute(base_credits(op), resolution)
}

/// Like [`operation_cost`] but for a raw identifier.
pub fn operation_cost_for(id: &str, resolution: &str) -> u64 {
    cost_per_minute(base_credits_for(id), resolution)
}

fn cost_per_minute(base: u32, resolution: &str) -> u64 {
    let multiplier = quality_multiplier(parse_height(resolution));
    (f64::from(base) * multiplier * TOMAN_PER_CREDIT).ceil() as u64
}

/// Cost preview for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Billed minutes, at least one.
    pub minutes: u64,
    pub cost_per_minute: u64,
    pub total: u64,
    /// Balance left after paying, when a balance was given.
    pub remaining: Option<i64>,
    pub affordable: Option<bool>,
}

/// Estimates the total cost of running `op` on a video.
///
/// Every started minute is billed and at least one minute is charged.
pub fn estimate_cost(
    op: OperationType,
    resolution: &str,
    duration_secs: f64,
    balance: Option<i64>,
) -> CostEstimate {
    let minutes = billed_minutes(duration_secs);
    let cost_per_minute = operation_cost(op, resolution);
    let total = minutes * cost_per_minute;
    let remaining = balance.map(|b| b - total as i64);
    CostEstimate {
        minutes,
        cost_per_minute,
        total,
        remaining,
        affordable: remaining.map(|r| r >= 0),
    }
}

fn billed_minutes(duration_secs: f64) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 1;
    }
    ((duration_secs / 60.0).ceil() as u64).max(1)
}

/// Rough duration guess of one minute per MiB, never under a minute.
pub fn estimate_duration_from_size(bytes: u64) -> f64 {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    (mb * 60.0).max(60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_costs() {
        assert_eq!(operation_cost(OperationType::PersianDubbing, "1920x1080"), 7500);
        assert_eq!(operation_cost(OperationType::EnglishSubtitle, "3840x2160"), 6000);
    }

    #[test]
    fn base_costs_at_720p() {
        let expected = [3000, 4000, 5000, 6000, 6000];
        for (op, cost) in OperationType::ALL.into_iter().zip(expected) {
            assert_eq!(operation_cost(op, "720p"), cost, "{op}");
        }
    }

    #[test]
    fn unknown_identifier_uses_default_base() {
        assert_eq!(base_credits_for("mystery"), DEFAULT_BASE_CREDITS);
        assert_eq!(operation_cost_for("mystery", "1080p"), 4500);
        assert_eq!(operation_cost_for("persian_subtitle", "1080p"), 6000);
    }

    #[test]
    fn estimate_rounds_minutes_up() {
        let est = estimate_cost(OperationType::PersianDubbing, "1920x1080", 61.0, None);
        assert_eq!(est.minutes, 2);
        assert_eq!(est.cost_per_minute, 7500);
        assert_eq!(est.total, 15_000);
        assert_eq!(est.remaining, None);
        assert_eq!(est.affordable, None);
    }

    #[test]
    fn estimate_bills_at_least_one_minute() {
        assert_eq!(
            estimate_cost(OperationType::EnglishSubtitle, "720p", 5.0, None).minutes,
            1
        );
        assert_eq!(
            estimate_cost(OperationType::EnglishSubtitle, "720p", 0.0, None).minutes,
            1
        );
        assert_eq!(
            estimate_cost(OperationType::EnglishSubtitle, "720p", f64::NAN, None).minutes,
            1
        );
    }

    #[test]
    fn estimate_against_balance() {
        let ok = estimate_cost(OperationType::EnglishSubtitle, "720p", 120.0, Some(10_000));
        assert_eq!(ok.total, 6000);
        assert_eq!(ok.remaining, Some(4000));
        assert_eq!(ok.affordable, Some(true));

        let exact = estimate_cost(OperationType::EnglishSubtitle, "720p", 120.0, Some(6000));
        assert_eq!(exact.affordable, Some(true));

        let short = estimate_cost(OperationType::EnglishSubtitle, "720p", 120.0, Some(1000));
        assert_eq!(short.remaining, Some(-5000));
        assert_eq!(short.affordable, Some(false));
    }

    #[test]
    fn duration_guess_from_size() {
        assert_eq!(estimate_duration_from_size(0), 60.0);
        assert_eq!(estimate_duration_from_size(512 * 1024), 60.0);
        assert_eq!(estimate_duration_from_size(10 * 1024 * 1024), 600.0);
    }
}

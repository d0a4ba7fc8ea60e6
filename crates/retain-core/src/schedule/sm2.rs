//! SM-2 (SuperMemo 2) review rule
//!
//! - Quality < 3: lapse, restart at repetition 0 with a 1-day interval
//! - Quality >= 3: 1 day, then 6 days, then `round(interval * EF)`
//! - EF is adjusted on every review and never drops below 1.3

use super::state::{MIN_EASINESS, Quality, Sm2State};

/// Interval after the first successful repetition
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second successful repetition
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Interval scheduled after a lapse
pub const LAPSE_INTERVAL_DAYS: u32 = 1;

/// Updated easiness factor for a rating.
///
/// `EF' = max(1.3, EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)))`
pub fn next_easiness(easiness_factor: f64, quality: Quality) -> f64 {
    let miss = 5.0 - f64::from(quality.value());
    let next = easiness_factor + (0.1 - miss * (0.08 + miss * 0.02));
    if next.is_finite() {
        next.max(MIN_EASINESS)
    } else {
        MIN_EASINESS
    }
}

/// Apply one review to an SM-2 state.
///
/// The interval multiplier is the easiness factor held before this review.
/// Intervals are capped at `max_interval_days`.
pub fn next_state(state: &Sm2State, quality: Quality, max_interval_days: u32) -> Sm2State {
    let (interval, repetitions) = if quality.is_pass() {
        let repetitions = state.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            _ => grow_interval(state.interval, state.easiness_factor.max(MIN_EASINESS)),
        };
        (interval.min(max_interval_days).max(1), repetitions)
    } else {
        (LAPSE_INTERVAL_DAYS, 0)
    };

    Sm2State {
        easiness_factor: next_easiness(state.easiness_factor, quality),
        interval,
        repetitions,
    }
}

fn grow_interval(interval: u32, easiness_factor: f64) -> u32 {
    let grown = (f64::from(interval) * easiness_factor).round();
    if grown >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        // A restored state may carry repetitions >= 2 with interval 0
        (grown as u32).max(1)
    }
}

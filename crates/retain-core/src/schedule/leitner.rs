//! Leitner box rule
//!
//! Success moves an item up one box (capped at the last box), failure
//! moves it down one box (floored at box 0). Each box has a fixed
//! review interval.

use super::state::{LEITNER_BOXES, LeitnerState, MAX_LEITNER_BOX, Quality};

/// Default review interval in days for boxes 0..=5
pub const DEFAULT_LEITNER_INTERVALS: [u32; LEITNER_BOXES] = [1, 3, 7, 14, 30, 90];

/// Apply one review to a Leitner state
pub fn next_state(state: &LeitnerState, quality: Quality) -> LeitnerState {
    let current = state.box_index.min(MAX_LEITNER_BOX);
    let box_index = if quality.is_pass() {
        (current + 1).min(MAX_LEITNER_BOX)
    } else {
        current.saturating_sub(1)
    };
    LeitnerState { box_index }
}

/// Interval in days for a box
pub fn interval_for_box(box_index: u8, intervals: &[u32; LEITNER_BOXES]) -> u32 {
    intervals[usize::from(box_index.min(MAX_LEITNER_BOX))]
}

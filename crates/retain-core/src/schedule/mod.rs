//! Spaced Repetition Scheduling Module
//!
//! Two interchangeable policies decide when an item is shown next:
//!
//! - **SM-2**: per-item easiness factor, intervals 1 → 6 → `round(interval × EF)`
//! - **Leitner**: six boxes with fixed intervals `[1, 3, 7, 14, 30, 90]` days
//!
//! The policy is carried by the item's [`ScheduleState`] and never mixed
//! for the same item. Scheduling is a pure function from one state value to
//! the next, so distinct items can be scheduled on any thread.

pub mod leitner;
pub mod sm2;

mod scheduler;
mod state;

pub use scheduler::{
    DEFAULT_MAX_INTERVAL_DAYS, PreviewOutcome, PreviewResults, ReviewScheduler,
    SchedulerParameters,
};

pub use state::{
    Algorithm, AlgorithmKind, ItemKey, LeitnerState, Quality, ScheduleState, Sm2State,
    // Constants
    INITIAL_EASINESS,
    LEITNER_BOXES,
    MAX_LEITNER_BOX,
    MAX_QUALITY,
    MIN_EASINESS,
    MIN_QUALITY,
    PASSING_QUALITY,
};

pub use leitner::DEFAULT_LEITNER_INTERVALS;

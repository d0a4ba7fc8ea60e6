//! Property tests: scheduling invariants over arbitrary states and ratings.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use retain_core::schedule::{
    Algorithm, AlgorithmKind, LeitnerState, MAX_LEITNER_BOX, MIN_EASINESS, Quality,
    ReviewScheduler, ScheduleState, Sm2State,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

fn arb_sm2_state() -> impl Strategy<Value = ScheduleState> {
    (1300u32..=4000, 0u32..=3650, 0u32..=50, 0u32..=500).prop_map(|(ef, interval, reps, count)| {
        let mut state = ScheduleState::new("prop", "card", AlgorithmKind::Sm2, now());
        state.algorithm = Algorithm::Sm2(Sm2State {
            easiness_factor: f64::from(ef) / 1000.0,
            interval,
            repetitions: reps,
        });
        state.review_count = count;
        state
    })
}

fn arb_leitner_state() -> impl Strategy<Value = ScheduleState> {
    (0u8..=MAX_LEITNER_BOX, 0u32..=500).prop_map(|(box_index, count)| {
        let mut state = ScheduleState::new("prop", "card", AlgorithmKind::Leitner, now());
        state.algorithm = Algorithm::Leitner(LeitnerState { box_index });
        state.review_count = count;
        state
    })
}

fn arb_state() -> impl Strategy<Value = ScheduleState> {
    prop_oneof![arb_sm2_state(), arb_leitner_state()]
}

/// Ratings well outside 0..=5 exercise clamping
fn arb_raw_quality() -> impl Strategy<Value = i64> {
    -20i64..=25
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_state_bounds_hold(state in arb_state(), raw in arb_raw_quality()) {
        let scheduler = ReviewScheduler::default();
        let next = scheduler.schedule_at(&state, Quality::new(raw), now());

        match next.algorithm {
            Algorithm::Sm2(s) => {
                prop_assert!(s.easiness_factor >= MIN_EASINESS);
                prop_assert!(s.repetitions == 0 || s.interval >= 1);
                prop_assert!(s.interval >= 1);
            }
            Algorithm::Leitner(s) => prop_assert!(s.box_index <= MAX_LEITNER_BOX),
        }
        prop_assert_eq!(next.kind(), state.kind());
        prop_assert!((0.0..=1.0).contains(&next.normalized_score()));
    }

    #[test]
    fn prop_bookkeeping_and_due_date(state in arb_state(), raw in arb_raw_quality()) {
        let scheduler = ReviewScheduler::default();
        let at = now() + Duration::minutes(17);
        let next = scheduler.schedule_at(&state, Quality::new(raw), at);

        prop_assert_eq!(next.review_count, state.review_count + 1);
        prop_assert_eq!(next.last_reviewed, Some(at));
        let days = i64::from(scheduler.interval_days(&next));
        prop_assert_eq!(next.next_review, Some(at + Duration::days(days)));
        prop_assert_eq!(&next.item_id, &state.item_id);
    }

    #[test]
    fn prop_sm2_lapse_restarts(state in arb_sm2_state(), q in 0i64..3) {
        let next = ReviewScheduler::default().schedule_at(&state, Quality::new(q), now());
        let s = next.sm2().unwrap();
        prop_assert_eq!(s.repetitions, 0);
        prop_assert_eq!(s.interval, 1);
    }

    #[test]
    fn prop_leitner_lapse_steps_down(state in arb_leitner_state(), q in 0i64..3) {
        let before = state.leitner().unwrap().box_index;
        let next = ReviewScheduler::default().schedule_at(&state, Quality::new(q), now());
        prop_assert_eq!(next.leitner().unwrap().box_index, before.saturating_sub(1));
    }

    #[test]
    fn prop_leitner_pass_steps_up(state in arb_leitner_state(), q in 3i64..=5) {
        let before = state.leitner().unwrap().box_index;
        let next = ReviewScheduler::default().schedule_at(&state, Quality::new(q), now());
        prop_assert_eq!(next.leitner().unwrap().box_index, (before + 1).min(MAX_LEITNER_BOX));
    }

    #[test]
    fn prop_perfect_recall_never_shrinks_interval(reviews in 3usize..40) {
        let scheduler = ReviewScheduler::default();
        let mut state = ScheduleState::new("mono", "card", AlgorithmKind::Sm2, now());
        let mut intervals = Vec::with_capacity(reviews);
        for _ in 0..reviews {
            state = scheduler.schedule_at(&state, Quality::new(5), now());
            intervals.push(state.sm2().unwrap().interval);
        }
        prop_assert!(intervals.windows(2).all(|w| w[0] <= w[1]), "{:?}", intervals);
    }

    #[test]
    fn prop_schedule_is_pure(state in arb_state(), raw in arb_raw_quality()) {
        let scheduler = ReviewScheduler::default();
        let copy = state.clone();
        let a = scheduler.schedule_at(&state, Quality::new(raw), now());
        let b = scheduler.schedule_at(&state, Quality::new(raw), now());
        prop_assert_eq!(a, b);
        prop_assert_eq!(state, copy);
    }

    #[test]
    fn prop_preview_matches_schedule(state in arb_state()) {
        let scheduler = ReviewScheduler::default();
        let preview = scheduler.preview_at(&state, now());
        prop_assert_eq!(preview.outcomes.len(), 6);
        for outcome in &preview.outcomes {
            prop_assert_eq!(&outcome.state, &scheduler.schedule_at(&state, outcome.quality, now()));
        }
    }
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn test_sm2_worked_scenario() {
    let scheduler = ReviewScheduler::default();
    let start = ScheduleState::new("c", "card", AlgorithmKind::Sm2, now());

    let first = scheduler.schedule_at(&start, Quality::new(5), now());
    let s = first.sm2().unwrap();
    assert!((s.easiness_factor - 2.6).abs() < 1e-9);
    assert_eq!((s.interval, s.repetitions), (1, 1));

    let second = scheduler.schedule_at(&first, Quality::new(4), now());
    let s = second.sm2().unwrap();
    assert!((s.easiness_factor - 2.6).abs() < 1e-9);
    assert_eq!((s.interval, s.repetitions), (6, 2));
}

#[test]
fn test_leitner_worked_scenario() {
    let scheduler = ReviewScheduler::default();
    let start = ScheduleState::new("c", "card", AlgorithmKind::Leitner, now());

    let up = scheduler.schedule_at(&start, Quality::new(4), now());
    assert_eq!(up.leitner().unwrap().box_index, 1);
    assert_eq!(up.next_review, Some(now() + Duration::days(3)));

    let down = scheduler.schedule_at(&up, Quality::new(2), now());
    assert_eq!(down.leitner().unwrap().box_index, 0);
    assert_eq!(down.next_review, Some(now() + Duration::days(1)));
}

//! # Adversarial Tests
//!
//! Inputs at and beyond the documented domain: out-of-range ratings,
//! non-numeric scores, far-future clocks, odd identifiers.

use chrono::{DateTime, Duration, TimeZone, Utc};
use retain_core::adaptive::{AdaptiveDifficultySelector, distribute};
use retain_core::mastery::{Difficulty, MasteryEstimator, QuizResult, ReviewEntry};
use retain_core::schedule::{
    Algorithm, AlgorithmKind, ItemKey, Quality, ReviewScheduler, ScheduleState, SchedulerParameters,
    Sm2State,
};
use retain_core::StorageError;
use retain_e2e_tests::{StoreKind, TestStoreManager};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_out_of_range_quality_is_clamped() {
    let scheduler = ReviewScheduler::default();
    let state = ScheduleState::new("c", "card", AlgorithmKind::Sm2, now());

    assert_eq!(
        scheduler.schedule_at(&state, Quality::new(i64::MAX), now()),
        scheduler.schedule_at(&state, Quality::new(5), now())
    );
    assert_eq!(
        scheduler.schedule_at(&state, Quality::new(i64::MIN), now()),
        scheduler.schedule_at(&state, Quality::new(0), now())
    );
}

#[test]
fn test_runaway_interval_is_capped() {
    let scheduler = ReviewScheduler::new(SchedulerParameters {
        max_interval_days: 1000,
        ..Default::default()
    });
    let mut state = ScheduleState::new("c", "card", AlgorithmKind::Sm2, now());
    state.algorithm = Algorithm::Sm2(Sm2State {
        easiness_factor: 50.0,
        interval: 900,
        repetitions: 40,
    });

    let next = scheduler.schedule_at(&state, Quality::new(5), now());
    assert_eq!(next.sm2().unwrap().interval, 1000);
    assert_eq!(next.next_review, Some(now() + Duration::days(1000)));
}

#[test]
fn test_due_date_saturates_at_end_of_time() {
    let scheduler = ReviewScheduler::default();
    let late = DateTime::<Utc>::MAX_UTC - Duration::days(2);
    let state = ScheduleState::new("c", "card", AlgorithmKind::Leitner, late);
    let mut state = scheduler.schedule_at(&state, Quality::new(5), late);
    state = scheduler.schedule_at(&state, Quality::new(5), late);

    assert_eq!(state.next_review, Some(DateTime::<Utc>::MAX_UTC));
    assert!(!state.is_due(late));
}

#[test]
fn test_non_numeric_and_extreme_scores() {
    let estimator = MasteryEstimator::default();
    let quizzes = vec![
        QuizResult::new("a", f64::NAN, Difficulty::Hard, now()),
        QuizResult::new("a", f64::INFINITY, Difficulty::Easy, now()),
        QuizResult::new("b", -3.0, Difficulty::Medium, now()),
    ];
    let reviews = vec![ReviewEntry::new(99, now() + Duration::days(30))];

    let report = estimator.estimate_at(None, &quizzes, &reviews, now());
    assert!(report.score.is_finite());
    assert!((0.0..=1.0).contains(&report.score));
    assert!((0.0..=1.0).contains(&report.confidence));
    // The future-dated review counts as fresh
    assert_eq!(report.breakdown.review, Some(1.0));
    assert_eq!(report.strengths[0].topic, "a");
    assert_eq!(report.weaknesses[0].topic, "b");

    let plan = AdaptiveDifficultySelector::default().select(&report);
    assert_eq!(plan.focus_areas, vec!["b".to_string()]);
}

#[test]
fn test_stores_reject_unrepresentable_scores() {
    for kind in StoreKind::ALL {
        let db = TestStoreManager::new_temp(kind);
        let key = ItemKey::new("c", "card");
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = db
                .engine
                .record_quiz(&key, &QuizResult::new("t", score, Difficulty::Easy, now()));
            assert!(
                matches!(result, Err(StorageError::InvalidRecord(_))),
                "{:?} accepted {}",
                kind,
                score
            );
        }
        assert!(db.store().quiz_results(&key).unwrap().is_empty());
    }
}

#[test]
fn test_odd_identifiers_round_trip() {
    let ids = ["", "with space", "quote'\"", "ünïcödé 学习", "semi;colon -- drop"];
    for kind in StoreKind::ALL {
        let mut db = TestStoreManager::new_temp(kind);
        for id in ids {
            let key = ItemKey::new(id, "card");
            db.engine
                .review_at(&key, AlgorithmKind::Sm2, Quality::new(3), now())
                .unwrap();
        }

        db.reopen();
        for id in ids {
            let state = db.store().load_state(&ItemKey::new(id, "card")).unwrap();
            assert_eq!(state.map(|s| s.item_id), Some(id.to_string()), "{:?}", kind);
        }
        assert_eq!(db.item_count(), ids.len());
    }
}

#[test]
fn test_degenerate_distribution() {
    assert!(distribute(10, &[]).is_empty());
    let dist = distribute(0, &retain_core::adaptive::QuestionType::ALL);
    assert!(dist.iter().all(|c| c.count == 0));
    assert_eq!(dist.len(), 3);
}

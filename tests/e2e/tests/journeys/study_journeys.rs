//! # Study Journey Tests
//!
//! Complete learner workflows run against every storage strategy:
//! review → schedule → due lookup → quiz → mastery → adaptive request.

use chrono::{DateTime, Duration, TimeZone, Utc};
use retain_core::{
    AlgorithmKind, Difficulty, EngineConfig, QuestionType, Quality, QuizResult,
};
use retain_e2e_tests::{BatchConfig, StoreKind, TestDataFactory, TestStoreManager, init_tracing};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

// ============================================================================
// SCHEDULING JOURNEYS
// ============================================================================

/// Test that an SM-2 card walks 1 → 6 → 16 days and lapses back to 1
#[test]
fn test_sm2_card_lifecycle() {
    init_tracing();
    for kind in StoreKind::ALL {
        let mut db = TestStoreManager::new_temp(kind);
        let key = TestDataFactory::key("flashcard");

        let states =
            TestDataFactory::review_sequence(&db.engine, &key, AlgorithmKind::Sm2, &[5, 4, 4], start());
        let intervals: Vec<u32> = states.iter().map(|s| s.sm2().unwrap().interval).collect();
        assert_eq!(intervals, vec![1, 6, 16], "{:?}", kind);

        let last = states.last().unwrap().clone();
        db.reopen();
        assert_eq!(db.store().load_state(&key).unwrap(), Some(last.clone()), "{:?}", kind);

        // Forgotten on the next due date
        let due_at = last.next_review.unwrap();
        let lapsed = db
            .engine
            .review_at(&key, AlgorithmKind::Sm2, Quality::new(1), due_at)
            .unwrap();
        let sm2 = lapsed.sm2().unwrap();
        assert_eq!((sm2.interval, sm2.repetitions), (1, 0), "{:?}", kind);
        assert_eq!(lapsed.review_count, 4);
        assert_eq!(lapsed.next_review, Some(due_at + Duration::days(1)));

        assert_eq!(db.store().review_entries(&key).unwrap().len(), 4, "{:?}", kind);
    }
}

/// Test that a Leitner card climbs to the top box and stays there
#[test]
fn test_leitner_card_reaches_top_box() {
    for kind in StoreKind::ALL {
        let db = TestStoreManager::new_temp(kind);
        let key = TestDataFactory::key("flashcard");

        let states = TestDataFactory::review_sequence(
            &db.engine,
            &key,
            AlgorithmKind::Leitner,
            &[4, 4, 4, 4, 4, 5, 5],
            start(),
        );
        let boxes: Vec<u8> = states.iter().map(|s| s.leitner().unwrap().box_index).collect();
        assert_eq!(boxes, vec![1, 2, 3, 4, 5, 5, 5], "{:?}", kind);

        let last = states.last().unwrap();
        let gap = last.next_review.unwrap() - last.last_reviewed.unwrap();
        assert_eq!(gap, Duration::days(90));
    }
}

/// Test that an item keeps the policy it was created with
#[test]
fn test_policy_is_fixed_at_creation() {
    for kind in StoreKind::ALL {
        let db = TestStoreManager::new_temp(kind);
        let key = TestDataFactory::key("card");

        db.engine
            .review_at(&key, AlgorithmKind::Leitner, Quality::new(4), start())
            .unwrap();
        let again = db
            .engine
            .review_at(&key, AlgorithmKind::Sm2, Quality::new(4), start())
            .unwrap();

        assert_eq!(again.kind(), AlgorithmKind::Leitner, "{:?}", kind);
        assert_eq!(again.leitner().unwrap().box_index, 2);
    }
}

/// Test the due queue: ordering, limit and items that are not yet due
#[test]
fn test_due_queue() {
    for kind in StoreKind::ALL {
        let db = TestStoreManager::new_temp(kind);
        let now = start();
        let due = db.seed_due(5, AlgorithmKind::Sm2, now);
        db.seed_future(3, AlgorithmKind::Leitner, now);

        let queue = db.engine.due_at(now, 100).unwrap();
        assert_eq!(queue.len(), 5, "{:?}", kind);
        // Oldest due date first: due-4 was due 5 hours ago
        assert_eq!(queue[0].key(), due[4]);
        assert!(queue.windows(2).all(|w| w[0].next_review <= w[1].next_review));

        assert_eq!(db.engine.due_at(now, 2).unwrap().len(), 2);
        assert_eq!(db.engine.due_at(now + Duration::days(2), 100).unwrap().len(), 7);

        let stats = db.store().stats().unwrap();
        assert_eq!(stats.total_items, 8);
        assert_eq!(stats.sm2_items, 5);
        assert_eq!(stats.leitner_items, 3);
    }
}

/// Test a batch of mixed items reviewed several times each
#[test]
fn test_batch_of_mixed_items() {
    for kind in StoreKind::ALL {
        let db = TestStoreManager::new_temp(kind);
        let keys = TestDataFactory::create_batch(
            &db.engine,
            BatchConfig {
                count: 12,
                reviews_per_item: 3,
                ..Default::default()
            },
            start(),
        );

        assert_eq!(db.item_count(), 12, "{:?}", kind);
        for key in &keys {
            let state = db.store().load_state(key).unwrap().unwrap();
            assert_eq!(state.review_count, 3);
            assert_eq!(db.store().review_entries(key).unwrap().len(), 3);
        }
    }
}

// ============================================================================
// MASTERY JOURNEYS
// ============================================================================

/// Test that mastery and the adaptive request follow the learner's evidence
#[test]
fn test_quiz_evidence_drives_difficulty() {
    for kind in StoreKind::ALL {
        let mut db = TestStoreManager::new_temp(kind);
        let key = TestDataFactory::key("deck");
        let now = start() + Duration::days(30);

        // Nothing known yet
        let request = db
            .engine
            .quiz_request_at(&key, 5, &QuestionType::ALL, now)
            .unwrap();
        assert_eq!(request.difficulty, Difficulty::Easy);
        assert_eq!(request.focus_areas, vec!["general".to_string()]);
        let counts: Vec<u32> = request.question_type_counts.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![2, 2, 1]);

        // Strong quiz results and confident reviews
        for result in TestDataFactory::quiz_history(
            &[("graphs", 0.95), ("trees", 0.9), ("graphs", 1.0), ("heaps", 0.4)],
            now,
        ) {
            db.engine.record_quiz(&key, &result).unwrap();
        }
        TestDataFactory::review_sequence(&db.engine, &key, AlgorithmKind::Leitner, &[5, 5, 5, 5], start());

        db.reopen();
        let report = db.engine.mastery_at(&key, now).unwrap();
        assert!(report.score >= 0.7, "{:?} score {}", kind, report.score);
        assert!(report.confidence > 0.0);
        assert_eq!(report.strengths[0].topic, "graphs");
        assert_eq!(report.weak_topics(), vec!["heaps".to_string()]);
        assert!(report.recommendations[1].contains("heaps"));

        let request = db
            .engine
            .quiz_request_at(&key, 4, &[QuestionType::OpenEnded, QuestionType::FillBlank], now)
            .unwrap();
        assert_eq!(request.difficulty, Difficulty::Hard);
        assert_eq!(request.focus_areas, vec!["heaps".to_string()]);
        assert_eq!(request.total_questions(), 4);
    }
}

/// Test that a custom configuration flows through the engine
#[test]
fn test_engine_config_from_json() {
    let config = EngineConfig::from_json_str(
        r#"{
            "scheduler": { "leitnerIntervals": [1, 2, 4, 8, 16, 32] },
            "mastery": { "bands": { "foundationalBelow": 0.7, "advancedFrom": 0.95 } }
        }"#,
    )
    .unwrap();

    for kind in StoreKind::ALL {
        let db = TestStoreManager::with_config(kind, config.clone());
        let key = TestDataFactory::key("card");

        let state = db
            .engine
            .review_at(&key, AlgorithmKind::Leitner, Quality::new(5), start())
            .unwrap();
        assert_eq!(state.next_review, Some(start() + Duration::days(2)));

        db.engine
            .record_quiz(&key, &QuizResult::new("sets", 0.9, Difficulty::Hard, start()))
            .unwrap();
        let request = db
            .engine
            .quiz_request_at(&key, 3, &QuestionType::ALL, start())
            .unwrap();
        // Score 0.64 from box 1, the quiz and the review: medium under the
        // default bands, easy under these
        assert_eq!(request.difficulty, Difficulty::Easy);
    }
}

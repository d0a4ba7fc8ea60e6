//! # Legacy Import Journey
//!
//! Data written by older versions: untagged records, naive timestamps,
//! Leitner items recognised only by `box`, and the occasional corrupt row.

use chrono::{Duration, TimeZone, Utc};
use retain_core::storage::LegacyRecord;
use retain_core::{
    AlgorithmKind, EngineConfig, FileStore, ItemKey, Quality, ReviewStore, ScheduleState,
    SqliteStore, StorageError, StudyEngine,
};
use retain_e2e_tests::TestDataFactory;
use tempfile::TempDir;

fn write_legacy_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("legacy.json");
    let json = serde_json::to_string_pretty(&TestDataFactory::legacy_document()).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

/// Test that legacy items load with the right policy and stay reviewable
#[test]
fn test_open_legacy_file_and_continue_studying() {
    let dir = TempDir::new().unwrap();
    let path = write_legacy_file(&dir);
    let engine = StudyEngine::new(FileStore::open(&path).unwrap(), EngineConfig::default());

    let photo = ItemKey::new("photosynthesis", "flashcard");
    let state = engine.store().load_state(&photo).unwrap().unwrap();
    assert_eq!(state.kind(), AlgorithmKind::Sm2);
    assert_eq!(state.sm2().unwrap().interval, 6);
    assert_eq!(
        state.next_review,
        Some(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap())
    );

    let mitosis = ItemKey::new("mitosis", "flashcard");
    let state = engine.store().load_state(&mitosis).unwrap().unwrap();
    assert_eq!(state.kind(), AlgorithmKind::Leitner);
    assert_eq!(state.leitner().unwrap().box_index, 2);

    // The corrupt item is reported, not silently repaired
    let corrupted = engine
        .store()
        .load_state(&ItemKey::new("corrupted", "flashcard"));
    assert!(matches!(corrupted, Err(StorageError::InvalidRecord(_))));

    // Due queue skips the corrupt item and the never-scheduled one
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let due: Vec<String> = engine
        .due_at(now, 10)
        .unwrap()
        .into_iter()
        .map(|s| s.item_id)
        .collect();
    assert_eq!(due, vec!["photosynthesis", "mitosis"]);

    // Continue the SM-2 schedule where the old version left off
    let next = engine
        .review_at(&photo, AlgorithmKind::Leitner, Quality::new(5), now)
        .unwrap();
    let sm2 = next.sm2().unwrap();
    assert_eq!(sm2.repetitions, 3);
    assert_eq!(sm2.interval, 14); // round(6 * 2.36)
    assert_eq!(next.review_count, 4);

    // The rewritten file carries explicit tags from now on
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["items"]["flashcard/photosynthesis"]["algorithm"], "SM2");
    assert!(raw["items"]["flashcard/photosynthesis"].get("box").is_none());
}

/// Test moving legacy records into the SQLite store
#[test]
fn test_import_legacy_records_into_sqlite() {
    let dir = TempDir::new().unwrap();
    let document = TestDataFactory::legacy_document();
    let store = SqliteStore::new(Some(dir.path().join("import.db"))).unwrap();

    let mut imported = 0;
    let mut rejected = Vec::new();
    for (slot, value) in document["items"].as_object().unwrap() {
        let record: LegacyRecord = serde_json::from_value(value.clone()).unwrap();
        match ScheduleState::try_from(record) {
            Ok(state) => {
                store.save_state(&state).unwrap();
                imported += 1;
            }
            Err(_) => rejected.push(slot.clone()),
        }
    }

    assert_eq!(imported, 3);
    assert_eq!(rejected, vec!["flashcard/corrupted".to_string()]);

    let stats = store.stats().unwrap();
    assert_eq!(stats.sm2_items, 1);
    assert_eq!(stats.leitner_items, 2);

    let osmosis = store
        .load_state(&ItemKey::new("osmosis", "flashcard"))
        .unwrap()
        .unwrap();
    assert!(osmosis.next_review.is_none());
    assert!(osmosis.last_reviewed.is_none());

    // Sub-second legacy timestamps survive the move
    let mitosis = store
        .load_state(&ItemKey::new("mitosis", "flashcard"))
        .unwrap()
        .unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 1, 10, 12, 30, 0).unwrap() + Duration::milliseconds(500);
    assert_eq!(mitosis.next_review, Some(expected));
}

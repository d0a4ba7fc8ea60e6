//! Storage Module
//!
//! The persistence side of the engine, behind one trait with three
//! interchangeable strategies chosen at construction time:
//! - [`MemoryStore`]: in-process tables, for tests and embedders
//! - [`FileStore`]: a single JSON document in the legacy record shape
//! - [`SqliteStore`]: SQLite with versioned migrations
//!
//! Stores are responsible for serializing read-modify-write cycles on the
//! same item; the scheduling core itself performs no locking.

mod file;
mod legacy;
mod memory;
mod migrations;
mod sqlite;

pub use file::FileStore;
pub use legacy::{LegacyRecord, format_timestamp, parse_timestamp};
pub use memory::MemoryStore;
pub use migrations::{MIGRATIONS, Migration};
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::{QuizResult, ReviewEntry};
use crate::schedule::{AlgorithmKind, ItemKey, ScheduleState};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Persisted record does not describe a valid schedule state
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Counts of stored schedule states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_items: usize,
    pub sm2_items: usize,
    pub leitner_items: usize,
    pub quiz_results: usize,
    pub review_entries: usize,
}

impl StoreStats {
    fn count(&mut self, kind: AlgorithmKind) {
        self.add(kind, 1);
    }

    fn add(&mut self, kind: AlgorithmKind, items: usize) {
        self.total_items += items;
        match kind {
            AlgorithmKind::Sm2 => self.sm2_items += items,
            AlgorithmKind::Leitner => self.leitner_items += items,
        }
    }
}

/// Update applied inside [`ReviewStore::update_state`]
pub type StateUpdate<'a> = &'a mut dyn FnMut(ScheduleState) -> ScheduleState;

/// Storage collaborator for schedule states and evidence histories
pub trait ReviewStore: Send + Sync {
    /// Load the state of an item
    fn load_state(&self, key: &ItemKey) -> Result<Option<ScheduleState>>;

    /// Insert or replace the state of an item
    fn save_state(&self, state: &ScheduleState) -> Result<()>;

    /// Serialized read-modify-write of one item.
    ///
    /// A missing item starts from `ScheduleState::for_key(key, kind, now)`.
    /// An existing item keeps its own algorithm; `kind` only applies on
    /// creation. Returns the persisted result of `update`.
    fn update_state(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState>;

    /// [`ReviewStore::update_state`] and appending `entry` to the item's
    /// review history as one unit: either both are persisted or neither.
    fn record_review(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
        entry: &ReviewEntry,
    ) -> Result<ScheduleState>;

    /// Remove an item; returns whether it existed
    fn delete_state(&self, key: &ItemKey) -> Result<bool>;

    /// Items with `next_review <= now`, soonest first.
    /// Items without a due date are never returned.
    fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>>;

    /// Append a quiz result. Scores that are not finite numbers are
    /// rejected with [`StorageError::InvalidRecord`].
    fn append_quiz_result(&self, key: &ItemKey, result: &QuizResult) -> Result<()>;

    /// Quiz results in insertion order
    fn quiz_results(&self, key: &ItemKey) -> Result<Vec<QuizResult>>;

    fn append_review_entry(&self, key: &ItemKey, entry: &ReviewEntry) -> Result<()>;

    /// Review entries in insertion order
    fn review_entries(&self, key: &ItemKey) -> Result<Vec<ReviewEntry>>;

    fn stats(&self) -> Result<StoreStats>;
}

macro_rules! forward_review_store {
    ($($wrapper:ident),*) => {$(
        impl<T: ReviewStore + ?Sized> ReviewStore for $wrapper<T> {
            fn load_state(&self, key: &ItemKey) -> Result<Option<ScheduleState>> {
                (**self).load_state(key)
            }

            fn save_state(&self, state: &ScheduleState) -> Result<()> {
                (**self).save_state(state)
            }

            fn update_state(
                &self,
                key: &ItemKey,
                kind: AlgorithmKind,
                now: DateTime<Utc>,
                update: StateUpdate<'_>,
            ) -> Result<ScheduleState> {
                (**self).update_state(key, kind, now, update)
            }

            fn record_review(
                &self,
                key: &ItemKey,
                kind: AlgorithmKind,
                now: DateTime<Utc>,
                update: StateUpdate<'_>,
                entry: &ReviewEntry,
            ) -> Result<ScheduleState> {
                (**self).record_review(key, kind, now, update, entry)
            }

            fn delete_state(&self, key: &ItemKey) -> Result<bool> {
                (**self).delete_state(key)
            }

            fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>> {
                (**self).due_items(now, limit)
            }

            fn append_quiz_result(&self, key: &ItemKey, result: &QuizResult) -> Result<()> {
                (**self).append_quiz_result(key, result)
            }

            fn quiz_results(&self, key: &ItemKey) -> Result<Vec<QuizResult>> {
                (**self).quiz_results(key)
            }

            fn append_review_entry(&self, key: &ItemKey, entry: &ReviewEntry) -> Result<()> {
                (**self).append_review_entry(key, entry)
            }

            fn review_entries(&self, key: &ItemKey) -> Result<Vec<ReviewEntry>> {
                (**self).review_entries(key)
            }

            fn stats(&self) -> Result<StoreStats> {
                (**self).stats()
            }
        }
    )*};
}

// Shared and boxed stores, e.g. `Arc<SqliteStore>` or `Box<dyn ReviewStore>`
forward_review_store!(Arc, Box);

/// Sort due candidates soonest first and truncate
fn select_due(
    mut states: Vec<ScheduleState>,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScheduleState> {
    states.retain(|s| s.is_due(now));
    states.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then_with(|| a.item_type.cmp(&b.item_type))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    states.truncate(limit);
    states
}

fn check_quiz_result(key: &ItemKey, result: &QuizResult) -> Result<()> {
    if result.score.is_finite() {
        Ok(())
    } else {
        Err(StorageError::InvalidRecord(format!(
            "{}: quiz score {} is not a finite number",
            key, result.score
        )))
    }
}

fn poisoned(what: &str) -> StorageError {
    tracing::warn!("{} lock poisoned", what);
    StorageError::Init(format!("{} lock poisoned", what))
}

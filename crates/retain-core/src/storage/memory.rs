//! In-memory store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{
    ReviewStore, Result, StateUpdate, StoreStats, check_quiz_result, poisoned, select_due,
};
use crate::mastery::{QuizResult, ReviewEntry};
use crate::schedule::{AlgorithmKind, ItemKey, ScheduleState};

#[derive(Debug, Default)]
struct Tables {
    states: HashMap<ItemKey, ScheduleState>,
    quiz_results: HashMap<ItemKey, Vec<QuizResult>>,
    review_entries: HashMap<ItemKey, Vec<ReviewEntry>>,
}

impl Tables {
    fn apply(
        &mut self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> ScheduleState {
        let current = self
            .states
            .get(key)
            .cloned()
            .unwrap_or_else(|| ScheduleState::for_key(key, kind, now));
        let next = update(current);
        self.states.insert(key.clone(), next.clone());
        next
    }
}

/// Process-local store. One lock guards all tables, so every
/// `update_state` is atomic with respect to every other call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| poisoned("Memory store"))
    }
}

impl ReviewStore for MemoryStore {
    fn load_state(&self, key: &ItemKey) -> Result<Option<ScheduleState>> {
        Ok(self.tables()?.states.get(key).cloned())
    }

    fn save_state(&self, state: &ScheduleState) -> Result<()> {
        self.tables()?.states.insert(state.key(), state.clone());
        Ok(())
    }

    fn update_state(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState> {
        let mut tables = self.tables()?;
        Ok(tables.apply(key, kind, now, update))
    }

    fn record_review(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
        entry: &ReviewEntry,
    ) -> Result<ScheduleState> {
        let mut tables = self.tables()?;
        let next = tables.apply(key, kind, now, update);
        tables.review_entries.entry(key.clone()).or_default().push(*entry);
        Ok(next)
    }

    fn delete_state(&self, key: &ItemKey) -> Result<bool> {
        Ok(self.tables()?.states.remove(key).is_some())
    }

    fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>> {
        let states = self.tables()?.states.values().cloned().collect();
        Ok(select_due(states, now, limit))
    }

    fn append_quiz_result(&self, key: &ItemKey, result: &QuizResult) -> Result<()> {
        check_quiz_result(key, result)?;
        self.tables()?
            .quiz_results
            .entry(key.clone())
            .or_default()
            .push(result.clone());
        Ok(())
    }

    fn quiz_results(&self, key: &ItemKey) -> Result<Vec<QuizResult>> {
        Ok(self.tables()?.quiz_results.get(key).cloned().unwrap_or_default())
    }

    fn append_review_entry(&self, key: &ItemKey, entry: &ReviewEntry) -> Result<()> {
        self.tables()?
            .review_entries
            .entry(key.clone())
            .or_default()
            .push(*entry);
        Ok(())
    }

    fn review_entries(&self, key: &ItemKey) -> Result<Vec<ReviewEntry>> {
        Ok(self.tables()?.review_entries.get(key).cloned().unwrap_or_default())
    }

    fn stats(&self) -> Result<StoreStats> {
        let tables = self.tables()?;
        let mut stats = StoreStats::default();
        for state in tables.states.values() {
            stats.count(state.kind());
        }
        stats.quiz_results = tables.quiz_results.values().map(Vec::len).sum();
        stats.review_entries = tables.review_entries.values().map(Vec::len).sum();
        Ok(stats)
    }
}

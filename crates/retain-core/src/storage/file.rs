//! JSON file store
//!
//! Keeps the whole document in memory and rewrites it after every
//! mutation (temp file + rename, so a crash never leaves a torn file).
//! A mutation is applied to a copy that replaces the in-memory document
//! only once it has been written, so a failed write changes nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::legacy::LegacyRecord;
use super::{
    ReviewStore, Result, StateUpdate, StoreStats, check_quiz_result, poisoned, select_due,
};
use crate::mastery::{QuizResult, ReviewEntry};
use crate::schedule::{AlgorithmKind, ItemKey, ScheduleState};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    version: u32,
    /// Keyed by `item_type/item_id`
    #[serde(default)]
    items: BTreeMap<String, LegacyRecord>,
    #[serde(default)]
    quiz_results: BTreeMap<String, Vec<QuizResult>>,
    #[serde(default)]
    review_entries: BTreeMap<String, Vec<ReviewEntry>>,
}

/// Store backed by one JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl FileStore {
    /// Open the document at `path`, creating an empty one if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let document = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Document::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Document::default()
        };

        tracing::info!(
            path = %path.display(),
            items = document.items.len(),
            "Opened file store"
        );

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> Result<MutexGuard<'_, Document>> {
        self.document.lock().map_err(|_| poisoned("File store"))
    }

    fn persist(&self, document: &mut Document) -> Result<()> {
        document.version = DOCUMENT_VERSION;
        let json = serde_json::to_string_pretty(&*document)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy of `document`, write the copy, then swap it in
    fn commit<T>(
        &self,
        document: &mut Document,
        change: impl FnOnce(&mut Document) -> Result<T>,
    ) -> Result<T> {
        let mut next = document.clone();
        let value = change(&mut next)?;
        self.persist(&mut next)?;
        *document = next;
        Ok(value)
    }
}

impl Document {
    fn apply(
        &mut self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState> {
        let slot = key.to_string();
        let current = match self.items.get(&slot).cloned() {
            Some(record) => with_slot(record, &slot).into_state()?,
            None => ScheduleState::for_key(key, kind, now),
        };
        let next = update(current);
        self.items.insert(slot, LegacyRecord::from_state(&next));
        Ok(next)
    }
}

impl ReviewStore for FileStore {
    fn load_state(&self, key: &ItemKey) -> Result<Option<ScheduleState>> {
        let document = self.document()?;
        let slot = key.to_string();
        document
            .items
            .get(&slot)
            .cloned()
            .map(|record| with_slot(record, &slot).into_state())
            .transpose()
    }

    fn save_state(&self, state: &ScheduleState) -> Result<()> {
        let mut document = self.document()?;
        self.commit(&mut document, |next| {
            next.items
                .insert(state.key().to_string(), LegacyRecord::from_state(state));
            Ok(())
        })
    }

    fn update_state(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState> {
        let mut document = self.document()?;
        self.commit(&mut document, |next| next.apply(key, kind, now, update))
    }

    fn record_review(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
        entry: &ReviewEntry,
    ) -> Result<ScheduleState> {
        let mut document = self.document()?;
        self.commit(&mut document, |next| {
            let state = next.apply(key, kind, now, update)?;
            next.review_entries
                .entry(key.to_string())
                .or_default()
                .push(*entry);
            Ok(state)
        })
    }

    fn delete_state(&self, key: &ItemKey) -> Result<bool> {
        let slot = key.to_string();
        let mut document = self.document()?;
        if !document.items.contains_key(&slot) {
            return Ok(false);
        }
        self.commit(&mut document, |next| Ok(next.items.remove(&slot).is_some()))
    }

    fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>> {
        let document = self.document()?;
        let mut states = Vec::with_capacity(document.items.len());
        for (slot, record) in &document.items {
            match with_slot(record.clone(), slot).into_state() {
                Ok(state) => states.push(state),
                Err(e) => tracing::warn!("Skipping malformed record {}: {}", slot, e),
            }
        }
        Ok(select_due(states, now, limit))
    }

    fn append_quiz_result(&self, key: &ItemKey, result: &QuizResult) -> Result<()> {
        check_quiz_result(key, result)?;
        let mut document = self.document()?;
        self.commit(&mut document, |next| {
            next.quiz_results
                .entry(key.to_string())
                .or_default()
                .push(result.clone());
            Ok(())
        })
    }

    fn quiz_results(&self, key: &ItemKey) -> Result<Vec<QuizResult>> {
        Ok(self
            .document()?
            .quiz_results
            .get(&key.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn append_review_entry(&self, key: &ItemKey, entry: &ReviewEntry) -> Result<()> {
        let mut document = self.document()?;
        self.commit(&mut document, |next| {
            next.review_entries
                .entry(key.to_string())
                .or_default()
                .push(*entry);
            Ok(())
        })
    }

    fn review_entries(&self, key: &ItemKey) -> Result<Vec<ReviewEntry>> {
        Ok(self
            .document()?
            .review_entries
            .get(&key.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn stats(&self) -> Result<StoreStats> {
        let document = self.document()?;
        let mut stats = StoreStats::default();
        for record in document.items.values() {
            if let Ok(kind) = record.kind() {
                stats.count(kind);
            }
        }
        stats.quiz_results = document.quiz_results.values().map(Vec::len).sum();
        stats.review_entries = document.review_entries.values().map(Vec::len).sum();
        Ok(stats)
    }
}

/// Legacy files may omit the identity fields inside the record; the
/// `item_type/item_id` slot it is stored under supplies them.
fn with_slot(mut record: LegacyRecord, slot: &str) -> LegacyRecord {
    let Some((item_type, item_id)) = slot.split_once('/') else {
        return record;
    };
    if record.item_id.is_empty() {
        record.item_id = item_id.to_string();
    }
    if record.item_type.is_empty() {
        record.item_type = item_type.to_string();
    }
    record
}

//! SQLite Storage Implementation
//!
//! Schedule states live in `schedule_states` using the legacy record
//! columns, evidence histories in append-only tables.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::legacy::{LegacyRecord, format_timestamp, parse_timestamp};
use super::{
    ReviewStore, Result, StateUpdate, StorageError, StoreStats, check_quiz_result, poisoned,
    select_due,
};
use crate::mastery::{Difficulty, QuizResult, ReviewEntry};
use crate::schedule::{AlgorithmKind, ItemKey, Quality, ScheduleState};

const STATE_COLUMNS: &str = r#"item_id, item_type, algorithm, easiness_factor, "interval",
    repetitions, "box", review_count, last_reviewed, next_review"#;

/// SQLite-backed store
///
/// Uses separate reader/writer connections. All methods take `&self`, so
/// the store can be shared as `Arc<SqliteStore>`. Read-modify-write cycles
/// run inside an immediate transaction on the writer.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("RETAIN_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Open (or create) the database. `None` uses the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "retain", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("retain.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Migrations run on the writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        tracing::info!(path = %path.display(), applied, "Opened SQLite store");

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer.lock().map_err(|_| poisoned("Writer"))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader.lock().map_err(|_| poisoned("Reader"))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<LegacyRecord> {
        Ok(LegacyRecord {
            item_id: row.get("item_id")?,
            item_type: row.get("item_type")?,
            algorithm: row.get("algorithm")?,
            easiness_factor: row.get("easiness_factor")?,
            interval: row.get("interval")?,
            repetitions: row.get("repetitions")?,
            review_count: row.get("review_count")?,
            last_reviewed: row.get("last_reviewed")?,
            next_review: row.get("next_review")?,
            box_index: row.get("box")?,
        })
    }

    fn query_record(conn: &Connection, key: &ItemKey) -> Result<Option<LegacyRecord>> {
        let sql = format!(
            "SELECT {} FROM schedule_states WHERE item_id = ?1 AND item_type = ?2",
            STATE_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![key.item_id, key.item_type], Self::row_to_record)
            .optional()?)
    }

    fn upsert(conn: &Connection, record: &LegacyRecord) -> Result<()> {
        conn.execute(
            r#"INSERT INTO schedule_states (
                item_id, item_type, algorithm, easiness_factor, "interval", repetitions,
                "box", review_count, last_reviewed, next_review, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(item_id, item_type) DO UPDATE SET
                algorithm = excluded.algorithm,
                easiness_factor = excluded.easiness_factor,
                "interval" = excluded."interval",
                repetitions = excluded.repetitions,
                "box" = excluded."box",
                review_count = excluded.review_count,
                last_reviewed = excluded.last_reviewed,
                next_review = excluded.next_review,
                updated_at = excluded.updated_at"#,
            params![
                record.item_id,
                record.item_type,
                record.algorithm,
                record.easiness_factor,
                record.interval,
                record.repetitions,
                record.box_index,
                record.review_count,
                record.last_reviewed,
                record.next_review,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn apply(
        conn: &Connection,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState> {
        let current = match Self::query_record(conn, key)? {
            Some(record) => record.into_state()?,
            None => ScheduleState::for_key(key, kind, now),
        };
        let next = update(current);
        Self::upsert(conn, &LegacyRecord::from_state(&next))?;
        Ok(next)
    }

    fn insert_review_entry(conn: &Connection, key: &ItemKey, entry: &ReviewEntry) -> Result<()> {
        conn.execute(
            "INSERT INTO review_entries (item_id, item_type, quality, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.item_id,
                key.item_type,
                entry.quality.value(),
                format_timestamp(entry.timestamp),
            ],
        )?;
        Ok(())
    }
}

impl ReviewStore for SqliteStore {
    fn load_state(&self, key: &ItemKey) -> Result<Option<ScheduleState>> {
        let reader = self.reader()?;
        Self::query_record(&reader, key)?
            .map(LegacyRecord::into_state)
            .transpose()
    }

    fn save_state(&self, state: &ScheduleState) -> Result<()> {
        let writer = self.writer()?;
        Self::upsert(&writer, &LegacyRecord::from_state(state))
    }

    fn update_state(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
    ) -> Result<ScheduleState> {
        let mut writer = self.writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next = Self::apply(&tx, key, kind, now, update)?;
        tx.commit()?;
        Ok(next)
    }

    fn record_review(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
        update: StateUpdate<'_>,
        entry: &ReviewEntry,
    ) -> Result<ScheduleState> {
        let mut writer = self.writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next = Self::apply(&tx, key, kind, now, update)?;
        Self::insert_review_entry(&tx, key, entry)?;
        tx.commit()?;
        Ok(next)
    }

    fn delete_state(&self, key: &ItemKey) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "DELETE FROM schedule_states WHERE item_id = ?1 AND item_type = ?2",
            params![key.item_id, key.item_type],
        )?;
        Ok(rows > 0)
    }

    fn due_items(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>> {
        // Older rows may hold offset or naive timestamps, which do not
        // compare lexically, so the due filter runs on parsed values.
        let reader = self.reader()?;
        let sql = format!(
            "SELECT {} FROM schedule_states WHERE next_review IS NOT NULL",
            STATE_COLUMNS
        );
        let mut stmt = reader.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        // A row whose columns do not fit the record types is skipped like
        // any other malformed row
        let mut states = Vec::new();
        while let Some(row) = rows.next()? {
            let parsed = Self::row_to_record(row)
                .map_err(StorageError::from)
                .and_then(LegacyRecord::into_state);
            match parsed {
                Ok(state) => states.push(state),
                Err(e) => {
                    let item_type: String = row.get("item_type").unwrap_or_default();
                    let item_id: String = row.get("item_id").unwrap_or_default();
                    tracing::warn!("Skipping malformed row {}/{}: {}", item_type, item_id, e);
                }
            }
        }
        Ok(select_due(states, now, limit))
    }

    fn append_quiz_result(&self, key: &ItemKey, result: &QuizResult) -> Result<()> {
        check_quiz_result(key, result)?;
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO quiz_results (item_id, item_type, topic, score, difficulty, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key.item_id,
                key.item_type,
                result.topic,
                result.score,
                result.difficulty.as_str(),
                format_timestamp(result.timestamp),
            ],
        )?;
        Ok(())
    }

    fn quiz_results(&self, key: &ItemKey) -> Result<Vec<QuizResult>> {
        let rows: Vec<(String, f64, String, String)> = {
            let reader = self.reader()?;
            let mut stmt = reader.prepare(
                "SELECT topic, score, difficulty, timestamp FROM quiz_results
                 WHERE item_id = ?1 AND item_type = ?2 ORDER BY id",
            )?;
            stmt.query_map(params![key.item_id, key.item_type], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<_>>()?
        };

        rows.into_iter()
            .map(|(topic, score, difficulty, timestamp)| -> Result<QuizResult> {
                let difficulty = difficulty
                    .parse::<Difficulty>()
                    .map_err(StorageError::InvalidRecord)?;
                Ok(QuizResult::new(topic, score, difficulty, parse_timestamp(&timestamp)?))
            })
            .collect()
    }

    fn append_review_entry(&self, key: &ItemKey, entry: &ReviewEntry) -> Result<()> {
        let writer = self.writer()?;
        Self::insert_review_entry(&writer, key, entry)
    }

    fn review_entries(&self, key: &ItemKey) -> Result<Vec<ReviewEntry>> {
        let rows: Vec<(i64, String)> = {
            let reader = self.reader()?;
            let mut stmt = reader.prepare(
                "SELECT quality, timestamp FROM review_entries
                 WHERE item_id = ?1 AND item_type = ?2 ORDER BY id",
            )?;
            stmt.query_map(params![key.item_id, key.item_type], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<_>>()?
        };

        rows.into_iter()
            .map(|(quality, timestamp)| -> Result<ReviewEntry> {
                Ok(ReviewEntry::new(Quality::new(quality), parse_timestamp(&timestamp)?))
            })
            .collect()
    }

    fn stats(&self) -> Result<StoreStats> {
        let reader = self.reader()?;
        let mut stats = StoreStats::default();

        // Untagged legacy rows are classified by `box`, as when loading them
        let mut stmt = reader.prepare(
            r#"SELECT algorithm, "box" IS NOT NULL, COUNT(*) FROM schedule_states
               GROUP BY algorithm, "box" IS NOT NULL"#,
        )?;
        let groups: Vec<(Option<String>, bool, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;

        for (algorithm, has_box, count) in groups {
            let record = LegacyRecord {
                algorithm,
                box_index: has_box.then_some(0),
                ..Default::default()
            };
            match record.kind() {
                Ok(kind) => stats.add(kind, count.max(0) as usize),
                Err(e) => tracing::warn!("{} schedule rows not counted: {}", count, e),
            }
        }

        stats.quiz_results =
            reader.query_row("SELECT COUNT(*) FROM quiz_results", [], |row| row.get::<_, i64>(0))?
                as usize;
        stats.review_entries = reader
            .query_row("SELECT COUNT(*) FROM review_entries", [], |row| row.get::<_, i64>(0))?
            as usize;

        Ok(stats)
    }
}

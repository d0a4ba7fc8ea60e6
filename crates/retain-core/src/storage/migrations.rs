//! Database Migrations
//!
//! Schema migration definitions for the SQLite store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: schedule states in the legacy record shape, evidence histories",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Explicit algorithm tag on schedule states",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS schedule_states (
    item_id TEXT NOT NULL,
    item_type TEXT NOT NULL,

    -- SM-2 fields (NULL for Leitner items)
    easiness_factor REAL,
    "interval" INTEGER,
    repetitions INTEGER,

    -- Leitner box (NULL for SM-2 items)
    "box" INTEGER,

    review_count INTEGER NOT NULL DEFAULT 0,
    last_reviewed TEXT,
    next_review TEXT,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (item_id, item_type)
);

CREATE INDEX IF NOT EXISTS idx_schedule_next_review ON schedule_states(next_review);

CREATE TABLE IF NOT EXISTS quiz_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    item_type TEXT NOT NULL,
    topic TEXT NOT NULL,
    score REAL NOT NULL,
    difficulty TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quiz_results_item ON quiz_results(item_type, item_id);

CREATE TABLE IF NOT EXISTS review_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    item_type TEXT NOT NULL,
    quality INTEGER NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_entries_item ON review_entries(item_type, item_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Algorithm tag, backfilled from the presence of a box
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE schedule_states ADD COLUMN algorithm TEXT;

UPDATE schedule_states
SET algorithm = CASE WHEN "box" IS NOT NULL THEN 'Leitner' ELSE 'SM2' END
WHERE algorithm IS NULL;

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (2, datetime('now'));
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}

//! # Retain Core
//!
//! Study scheduling engine for learning applications:
//!
//! - **SM-2**: per-item easiness factor, intervals grow 1 → 6 → `interval × EF`
//! - **Leitner**: six boxes with fixed intervals `[1, 3, 7, 14, 30, 90]` days
//! - **Mastery Estimation**: fuses scheduling progress, quiz results and
//!   review history into a score with confidence, strengths, weaknesses and
//!   study recommendations
//! - **Adaptive Difficulty**: turns a mastery report into quiz parameters
//!   (difficulty tier, focus areas, question-type counts)
//!
//! The scheduling, mastery and adaptive components are pure functions of
//! their inputs and an explicit clock. Persistence lives in [`storage`],
//! behind the [`ReviewStore`] trait with memory, JSON file and SQLite
//! strategies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retain_core::prelude::*;
//!
//! // Uses the platform data directory
//! let store = SqliteStore::new(None)?;
//! let engine = StudyEngine::new(store, EngineConfig::default());
//!
//! let key = ItemKey::new("mitochondria", "flashcard");
//! let state = engine.review(&key, AlgorithmKind::Sm2, Quality::new(4))?;
//!
//! let request = engine.quiz_request_at(&key, 5, &QuestionType::ALL, chrono::Utc::now())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Bundled SQLite for [`SqliteStore`]
//! - `encryption`: SQLCipher; set `RETAIN_ENCRYPTION_KEY` to encrypt the database

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod adaptive;
pub mod config;
pub mod engine;
pub mod mastery;
pub mod schedule;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Scheduling
pub use schedule::{
    Algorithm, AlgorithmKind, ItemKey, LeitnerState, PreviewOutcome, PreviewResults, Quality,
    ReviewScheduler, ScheduleState, SchedulerParameters, Sm2State,
};

// Mastery
pub use mastery::{
    Difficulty, MasteryConfig, MasteryEstimator, MasteryReport, MasteryWeights, QuizResult,
    ReviewEntry, ScoreBands, SubScores, TopicScore,
};

// Adaptive difficulty
pub use adaptive::{AdaptiveDifficultySelector, QuestionType, QuestionTypeCount, QuizPlan, QuizRequest};

// Storage layer
pub use storage::{
    FileStore, LegacyRecord, MemoryStore, Result, ReviewStore, SqliteStore, StorageError,
    StoreStats,
};

pub use config::{ConfigError, EngineConfig};
pub use engine::StudyEngine;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AlgorithmKind, Difficulty, EngineConfig, FileStore, ItemKey, MasteryReport, MemoryStore,
        Quality, QuestionType, QuizRequest, QuizResult, Result, ReviewScheduler, ReviewStore,
        ScheduleState, SqliteStore, StorageError, StudyEngine,
    };
}

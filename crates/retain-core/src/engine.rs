//! Study Engine
//!
//! Composes a [`ReviewStore`] with the scheduler, estimator and selector.
//! The components stay pure; this type only loads evidence, calls them and
//! persists what they return.

use chrono::{DateTime, Utc};

use crate::adaptive::{AdaptiveDifficultySelector, QuestionType, QuizRequest};
use crate::config::EngineConfig;
use crate::mastery::{MasteryEstimator, MasteryReport, QuizResult, ReviewEntry};
use crate::schedule::{
    AlgorithmKind, ItemKey, PreviewResults, Quality, ReviewScheduler, ScheduleState,
};
use crate::storage::{ReviewStore, Result};

pub struct StudyEngine<S: ReviewStore> {
    store: S,
    config: EngineConfig,
    scheduler: ReviewScheduler,
    estimator: MasteryEstimator,
    selector: AdaptiveDifficultySelector,
}

impl<S: ReviewStore> StudyEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            scheduler: ReviewScheduler::new(config.scheduler.clone()),
            estimator: MasteryEstimator::new(config.mastery.clone()),
            selector: AdaptiveDifficultySelector::new(config.mastery.bands),
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &ReviewScheduler {
        &self.scheduler
    }

    /// Review using the current wall clock
    pub fn review(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        quality: Quality,
    ) -> Result<ScheduleState> {
        self.review_at(key, kind, quality, Utc::now())
    }

    /// Record one review of `key` at `now`.
    ///
    /// A new item is created with `kind`; an existing item keeps its own
    /// policy. The same rating is appended to the item's review history in
    /// the same store operation.
    pub fn review_at(
        &self,
        key: &ItemKey,
        kind: AlgorithmKind,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ScheduleState> {
        self.store.record_review(
            key,
            kind,
            now,
            &mut |current| self.scheduler.schedule_at(&current, quality, now),
            &ReviewEntry::new(quality, now),
        )
    }

    /// Outcomes of every rating without persisting anything.
    /// `None` when the item has no schedule yet.
    pub fn preview_at(&self, key: &ItemKey, now: DateTime<Utc>) -> Result<Option<PreviewResults>> {
        Ok(self
            .store
            .load_state(key)?
            .map(|state| self.scheduler.preview_at(&state, now)))
    }

    pub fn record_quiz(&self, key: &ItemKey, result: &QuizResult) -> Result<()> {
        self.store.append_quiz_result(key, result)
    }

    /// Mastery of one item from everything stored about it
    pub fn mastery_at(&self, key: &ItemKey, now: DateTime<Utc>) -> Result<MasteryReport> {
        let state = self.store.load_state(key)?;
        let quiz_results = self.store.quiz_results(key)?;
        let review_entries = self.store.review_entries(key)?;
        Ok(self
            .estimator
            .estimate_at(state.as_ref(), &quiz_results, &review_entries, now))
    }

    /// Quiz parameters adapted to the item's current mastery
    pub fn quiz_request_at(
        &self,
        key: &ItemKey,
        count: u32,
        question_types: &[QuestionType],
        now: DateTime<Utc>,
    ) -> Result<QuizRequest> {
        let report = self.mastery_at(key, now)?;
        Ok(self.selector.build_request(&report, count, question_types))
    }

    /// Items due at `now`, soonest first
    pub fn due_at(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ScheduleState>> {
        self.store.due_items(now, limit)
    }
}

//! Review Scheduler
//!
//! Dispatches a review to the policy carried by the item's state and
//! stamps the review and due timestamps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::leitner::{self, DEFAULT_LEITNER_INTERVALS};
use super::sm2;
use super::state::{Algorithm, LEITNER_BOXES, Quality, ScheduleState};

/// Upper bound on any scheduled interval (100 years)
pub const DEFAULT_MAX_INTERVAL_DAYS: u32 = 36_500;

/// Tunable scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerParameters {
    /// Review interval in days for Leitner boxes 0..=5
    pub leitner_intervals: [u32; LEITNER_BOXES],
    /// Cap applied to SM-2 intervals so due dates stay representable
    pub max_interval_days: u32,
}

impl Default for SchedulerParameters {
    fn default() -> Self {
        Self {
            leitner_intervals: DEFAULT_LEITNER_INTERVALS,
            max_interval_days: DEFAULT_MAX_INTERVAL_DAYS,
        }
    }
}

/// Outcome of one hypothetical rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutcome {
    pub quality: Quality,
    pub interval_days: u32,
    pub state: ScheduleState,
}

/// Outcomes for every rating 0..=5, worst first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub outcomes: Vec<PreviewOutcome>,
}

impl PreviewResults {
    /// Outcome for a particular rating
    pub fn for_quality(&self, quality: Quality) -> Option<&PreviewOutcome> {
        self.outcomes.iter().find(|o| o.quality == quality)
    }
}

/// Computes the next scheduling state from the current one and a rating.
///
/// Total and side-effect free: out-of-range ratings are clamped by
/// [`Quality`], the input state is never modified.
#[derive(Debug, Clone, Default)]
pub struct ReviewScheduler {
    params: SchedulerParameters,
}

impl ReviewScheduler {
    pub fn new(params: SchedulerParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SchedulerParameters {
        &self.params
    }

    /// Schedule using the current wall clock
    pub fn schedule(&self, state: &ScheduleState, quality: Quality) -> ScheduleState {
        self.schedule_at(state, quality, Utc::now())
    }

    /// Schedule as of `now`
    pub fn schedule_at(
        &self,
        state: &ScheduleState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> ScheduleState {
        let (algorithm, interval_days) = match &state.algorithm {
            Algorithm::Sm2(current) => {
                let next = sm2::next_state(current, quality, self.params.max_interval_days);
                (Algorithm::Sm2(next), next.interval)
            }
            Algorithm::Leitner(current) => {
                let next = leitner::next_state(current, quality);
                let days = leitner::interval_for_box(next.box_index, &self.params.leitner_intervals);
                (Algorithm::Leitner(next), days)
            }
        };

        tracing::debug!(
            item_id = %state.item_id,
            algorithm = %state.kind(),
            quality = quality.value(),
            interval_days,
            "Scheduled review"
        );

        ScheduleState {
            item_id: state.item_id.clone(),
            item_type: state.item_type.clone(),
            algorithm,
            review_count: state.review_count.saturating_add(1),
            last_reviewed: Some(now),
            next_review: Some(add_days(now, interval_days)),
        }
    }

    /// Every possible outcome of reviewing `state` at `now`
    pub fn preview_at(&self, state: &ScheduleState, now: DateTime<Utc>) -> PreviewResults {
        let outcomes = Quality::ALL
            .iter()
            .map(|&quality| {
                let next = self.schedule_at(state, quality, now);
                PreviewOutcome {
                    quality,
                    interval_days: self.interval_days(&next),
                    state: next,
                }
            })
            .collect();
        PreviewResults { outcomes }
    }

    /// Interval the state's policy currently implies
    pub fn interval_days(&self, state: &ScheduleState) -> u32 {
        match &state.algorithm {
            Algorithm::Sm2(s) => s.interval,
            Algorithm::Leitner(s) => {
                leitner::interval_for_box(s.box_index, &self.params.leitner_intervals)
            }
        }
    }
}

fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

//! Mastery Estimator
//!
//! Fuses three independent evidence streams into one score:
//!
//! | Source  | Sub-score                                   | Base weight |
//! |---------|---------------------------------------------|-------------|
//! | SR      | normalized scheduling progress              | 0.4         |
//! | Quiz    | mean score weighted by recency × difficulty | 0.4         |
//! | Review  | mean `quality / 5` weighted by recency      | 0.2         |
//!
//! Absent sources get weight zero and the rest are renormalized.
//! Confidence averages evidence volume and evidence recency.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evidence::{QuizResult, ReviewEntry, recency_weight};
use super::recommendations::recommendations;
use super::report::{MasteryReport, SubScores, TopicScore};
use crate::schedule::ScheduleState;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Base weights of the three evidence sources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryWeights {
    pub sr: f64,
    pub quiz: f64,
    pub review: f64,
}

impl Default for MasteryWeights {
    fn default() -> Self {
        Self {
            sr: 0.4,
            quiz: 0.4,
            review: 0.2,
        }
    }
}

/// Score bands shared by recommendations and difficulty selection.
///
/// `score < foundational_below` is the foundational band,
/// `score >= advanced_from` the advanced band, everything between is practice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBands {
    pub foundational_below: f64,
    pub advanced_from: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            foundational_below: 0.3,
            advanced_from: 0.7,
        }
    }
}

/// Mastery estimation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryConfig {
    pub weights: MasteryWeights,
    /// Age in days at which evidence reaches the recency floor
    pub recency_window_days: f64,
    /// Minimum recency weight of any data point
    pub recency_floor: f64,
    /// Data points needed for full volume confidence
    pub volume_saturation: u32,
    /// Mean topic score at or above which a topic is a strength
    pub strength_threshold: f64,
    /// Mean topic score at or below which a topic is a weakness
    pub weakness_threshold: f64,
    /// Results per topic needed for full topic confidence
    pub topic_confidence_saturation: u32,
    /// Maximum weakness-specific recommendation lines
    pub max_weakness_recommendations: usize,
    pub bands: ScoreBands,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            weights: MasteryWeights::default(),
            recency_window_days: 365.0,
            recency_floor: 0.1,
            volume_saturation: 10,
            strength_threshold: 0.8,
            weakness_threshold: 0.6,
            topic_confidence_saturation: 5,
            max_weakness_recommendations: 3,
            bands: ScoreBands::default(),
        }
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

/// Estimates current mastery from scheduling, quiz and review evidence.
///
/// Every input may be empty; the estimator degrades to a zero report
/// instead of failing.
#[derive(Debug, Clone, Default)]
pub struct MasteryEstimator {
    config: MasteryConfig,
}

impl MasteryEstimator {
    pub fn new(config: MasteryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MasteryConfig {
        &self.config
    }

    /// Estimate using the current wall clock
    pub fn estimate(
        &self,
        sr_state: Option<&ScheduleState>,
        quiz_results: &[QuizResult],
        review_entries: &[ReviewEntry],
    ) -> MasteryReport {
        self.estimate_at(sr_state, quiz_results, review_entries, Utc::now())
    }

    /// Estimate as of `now`. Identical inputs give identical reports.
    pub fn estimate_at(
        &self,
        sr_state: Option<&ScheduleState>,
        quiz_results: &[QuizResult],
        review_entries: &[ReviewEntry],
        now: DateTime<Utc>,
    ) -> MasteryReport {
        let breakdown = SubScores {
            sr: sr_state.map(ScheduleState::normalized_score),
            quiz: self.quiz_sub_score(quiz_results, now),
            review: self.review_sub_score(review_entries, now),
        };

        let score = self.combine(&breakdown);
        let confidence = self.confidence(sr_state, quiz_results, review_entries, now);
        let (strengths, weaknesses) = topic_breakdown(quiz_results, &self.config);
        let recommendations = recommendations(score, &strengths, &weaknesses, &self.config);

        tracing::debug!(
            score,
            confidence,
            quiz_results = quiz_results.len(),
            review_entries = review_entries.len(),
            has_schedule = sr_state.is_some(),
            "Estimated mastery"
        );

        MasteryReport {
            score,
            confidence,
            strengths,
            weaknesses,
            recommendations,
            breakdown,
        }
    }

    fn recency(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        recency_weight(
            timestamp,
            now,
            self.config.recency_window_days,
            self.config.recency_floor,
        )
    }

    /// Recency × difficulty weighted mean quiz score
    fn quiz_sub_score(&self, quiz_results: &[QuizResult], now: DateTime<Utc>) -> Option<f64> {
        weighted_mean(quiz_results.iter().filter_map(|r| {
            r.clamped_score()
                .map(|score| (score, self.recency(r.timestamp, now) * r.difficulty.weight()))
        }))
    }

    /// Recency weighted mean of `quality / 5`
    fn review_sub_score(&self, review_entries: &[ReviewEntry], now: DateTime<Utc>) -> Option<f64> {
        weighted_mean(
            review_entries
                .iter()
                .map(|e| (e.quality.normalized(), self.recency(e.timestamp, now))),
        )
    }

    /// Renormalized weighted sum over the sources that are present
    fn combine(&self, sub: &SubScores) -> f64 {
        let w = &self.config.weights;
        let parts = [(sub.sr, w.sr), (sub.quiz, w.quiz), (sub.review, w.review)];

        let (total, weight) = parts
            .iter()
            .filter_map(|&(score, weight)| score.map(|s| (s, weight.max(0.0))))
            .fold((0.0, 0.0), |(acc, wsum), (s, w)| (acc + s * w, wsum + w));

        if weight > 0.0 {
            (total / weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Mean of volume confidence and recency confidence
    fn confidence(
        &self,
        sr_state: Option<&ScheduleState>,
        quiz_results: &[QuizResult],
        review_entries: &[ReviewEntry],
        now: DateTime<Utc>,
    ) -> f64 {
        let sr_recency = sr_state.map(|s| match s.last_reviewed {
            Some(at) => self.recency(at, now),
            // Never reviewed: the state exists but carries no dated evidence
            None => self.config.recency_floor,
        });

        let recencies: Vec<f64> = sr_recency
            .into_iter()
            .chain(
                quiz_results
                    .iter()
                    .filter(|r| r.clamped_score().is_some())
                    .map(|r| self.recency(r.timestamp, now)),
            )
            .chain(review_entries.iter().map(|e| self.recency(e.timestamp, now)))
            .collect();

        if recencies.is_empty() {
            return 0.0;
        }

        let points = recencies.len() as f64;
        let saturation = f64::from(self.config.volume_saturation.max(1));
        let volume = (points / saturation).min(1.0);
        let recency = recencies.iter().sum::<f64>() / points;

        ((volume + recency) / 2.0).clamp(0.0, 1.0)
    }
}

fn weighted_mean(values: impl Iterator<Item = (f64, f64)>) -> Option<f64> {
    let (sum, weight) = values.fold((0.0, 0.0), |(s, w), (value, weight)| {
        (s + value * weight, w + weight)
    });
    if weight > 0.0 {
        Some((sum / weight).clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Group quiz results by topic and classify strengths and weaknesses.
///
/// Strengths are ordered best first, weaknesses worst first; ties break on
/// topic name so the output is deterministic.
pub fn topic_breakdown(
    quiz_results: &[QuizResult],
    config: &MasteryConfig,
) -> (Vec<TopicScore>, Vec<TopicScore>) {
    let mut topics: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    for result in quiz_results {
        if let Some(score) = result.clamped_score() {
            let entry = topics.entry(result.topic.as_str()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let saturation = f64::from(config.topic_confidence_saturation.max(1));
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    for (topic, (sum, count)) in topics {
        let score = sum / f64::from(count);
        let topic_score = TopicScore {
            topic: topic.to_string(),
            score,
            confidence: (f64::from(count) / saturation).min(1.0),
        };
        if score >= config.strength_threshold {
            strengths.push(topic_score);
        } else if score <= config.weakness_threshold {
            weaknesses.push(topic_score);
        }
    }

    strengths.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.topic.cmp(&b.topic)));
    weaknesses.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.topic.cmp(&b.topic)));

    (strengths, weaknesses)
}

// ============================================================================
// TESTS
// ============================================================================

//! Mastery report types

use serde::{Deserialize, Serialize};

/// Mean quiz performance on one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicScore {
    pub topic: String,
    /// Mean quiz score, 0.0 - 1.0
    pub score: f64,
    /// Evidence volume for this topic, 0.0 - 1.0
    pub confidence: f64,
}

/// Per-source sub-scores; `None` when the source had no data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub sr: Option<f64>,
    pub quiz: Option<f64>,
    pub review: Option<f64>,
}

/// Fused mastery estimate for one item or topic.
///
/// Recomputed from scratch on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MasteryReport {
    /// Fused mastery, 0.0 - 1.0
    pub score: f64,
    /// How much evidence backs the score, 0.0 - 1.0
    pub confidence: f64,
    /// Topics at or above the strength threshold, best first
    pub strengths: Vec<TopicScore>,
    /// Topics at or below the weakness threshold, worst first
    pub weaknesses: Vec<TopicScore>,
    pub recommendations: Vec<String>,
    /// Source sub-scores that went into `score`
    pub breakdown: SubScores,
}

impl MasteryReport {
    /// Weak topic names in report order
    pub fn weak_topics(&self) -> Vec<String> {
        self.weaknesses.iter().map(|t| t.topic.clone()).collect()
    }

    /// Whether any evidence at all was available
    pub fn has_evidence(&self) -> bool {
        let SubScores { sr, quiz, review } = &self.breakdown;
        sr.is_some() || quiz.is_some() || review.is_some()
    }
}

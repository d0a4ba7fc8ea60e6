//! Evidence streams consumed by the mastery estimator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Quality;

/// Quiz difficulty, shared by quiz results and quiz requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Evidence weight of a result at this difficulty
    pub fn weight(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// One graded quiz attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    /// Topic the quiz covered
    pub topic: String,
    /// Fraction correct, 0.0 - 1.0
    pub score: f64,
    pub difficulty: Difficulty,
    pub timestamp: DateTime<Utc>,
}

impl QuizResult {
    pub fn new(
        topic: impl Into<String>,
        score: f64,
        difficulty: Difficulty,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            score,
            difficulty,
            timestamp,
        }
    }

    /// Score clamped into [0, 1]; `None` when the score is not a number
    pub fn clamped_score(&self) -> Option<f64> {
        if self.score.is_nan() {
            None
        } else {
            Some(self.score.clamp(0.0, 1.0))
        }
    }
}

/// One self-rated review, independent of scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub quality: Quality,
    pub timestamp: DateTime<Utc>,
}

impl ReviewEntry {
    pub fn new(quality: impl Into<Quality>, timestamp: DateTime<Utc>) -> Self {
        Self {
            quality: quality.into(),
            timestamp,
        }
    }
}

/// Linear decay of evidence weight with age.
///
/// `max(floor, 1 - days_ago / window_days)`, where `days_ago` counts whole
/// elapsed days and timestamps in the future count as zero days.
pub fn recency_weight(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    window_days: f64,
    floor: f64,
) -> f64 {
    let days_ago = (now - timestamp).num_days().max(0) as f64;
    let weight = if window_days > 0.0 {
        1.0 - days_ago / window_days
    } else {
        floor
    };
    weight.max(floor).clamp(0.0, 1.0)
}

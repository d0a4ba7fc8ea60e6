//! Adaptive Difficulty Selector
//!
//! Turns a mastery report into the parameters sent to the quiz content
//! generator: a difficulty tier, the topics to focus on, and how many
//! questions of each type to ask for.

use serde::{Deserialize, Serialize};

use super::distribution::{QuestionType, QuestionTypeCount, distribute};
use crate::mastery::{Difficulty, MasteryReport, ScoreBands};

/// Focus area used when a report has no weaknesses
pub const GENERAL_FOCUS: &str = "general";

/// Difficulty and focus derived from a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPlan {
    pub difficulty: Difficulty,
    pub focus_areas: Vec<String>,
}

/// Payload handed to the content generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub difficulty: Difficulty,
    pub focus_areas: Vec<String>,
    pub question_type_counts: Vec<QuestionTypeCount>,
}

impl QuizRequest {
    /// Total questions requested
    pub fn total_questions(&self) -> u32 {
        self.question_type_counts.iter().map(|c| c.count).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveDifficultySelector {
    bands: ScoreBands,
}

impl AdaptiveDifficultySelector {
    pub fn new(bands: ScoreBands) -> Self {
        Self { bands }
    }

    /// Difficulty tier for a mastery score
    pub fn difficulty_for(&self, score: f64) -> Difficulty {
        if score < self.bands.foundational_below {
            Difficulty::Easy
        } else if score < self.bands.advanced_from {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    pub fn select(&self, report: &MasteryReport) -> QuizPlan {
        let focus_areas = if report.weaknesses.is_empty() {
            vec![GENERAL_FOCUS.to_string()]
        } else {
            report.weak_topics()
        };

        QuizPlan {
            difficulty: self.difficulty_for(report.score),
            focus_areas,
        }
    }

    /// Plan plus a round-robin split of `count` questions over `question_types`
    pub fn build_request(
        &self,
        report: &MasteryReport,
        count: u32,
        question_types: &[QuestionType],
    ) -> QuizRequest {
        let plan = self.select(report);
        QuizRequest {
            difficulty: plan.difficulty,
            focus_areas: plan.focus_areas,
            question_type_counts: distribute(count, question_types),
        }
    }
}

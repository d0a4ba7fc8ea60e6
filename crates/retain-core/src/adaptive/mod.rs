//! Adaptive quiz difficulty
//!
//! - `score < 0.3` → easy, `score < 0.7` → medium, otherwise hard
//! - Focus areas are the report's weaknesses, or `"general"`

mod distribution;
mod selector;

pub use distribution::{QuestionType, QuestionTypeCount, distribute};
pub use selector::{AdaptiveDifficultySelector, GENERAL_FOCUS, QuizPlan, QuizRequest};

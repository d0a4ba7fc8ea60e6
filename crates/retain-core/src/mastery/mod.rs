//! Mastery Estimation Module
//!
//! Estimates how well a learner currently knows an item or topic by fusing
//! three noisy evidence streams:
//! - Scheduling state (how far the item has progressed through SM-2 or Leitner)
//! - Quiz results (weighted by recency and difficulty)
//! - Free-form review history (weighted by recency)
//!
//! The resulting [`MasteryReport`] carries a confidence value, per-topic
//! strengths and weaknesses, and study recommendations.

mod estimator;
mod evidence;
mod recommendations;
mod report;

pub use estimator::{MasteryConfig, MasteryEstimator, MasteryWeights, ScoreBands, topic_breakdown};
pub use evidence::{Difficulty, QuizResult, ReviewEntry, recency_weight};
pub use recommendations::recommendations;
pub use report::{MasteryReport, SubScores, TopicScore};

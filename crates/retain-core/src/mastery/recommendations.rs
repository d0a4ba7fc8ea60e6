//! Study recommendations derived from a mastery score

use super::estimator::MasteryConfig;
use super::report::TopicScore;

const FOUNDATIONAL: &str =
    "Start with a foundational review of the core concepts before attempting more quizzes.";
const PRACTICE: &str =
    "Focus on targeted practice of the areas where recall is still inconsistent.";
const ADVANCED: &str =
    "You have a solid grasp of this material; explore advanced applications and connections.";

/// Band advice, then up to `max_weakness_recommendations` weakness lines,
/// then one line for the strongest topic.
pub fn recommendations(
    score: f64,
    strengths: &[TopicScore],
    weaknesses: &[TopicScore],
    config: &MasteryConfig,
) -> Vec<String> {
    let bands = &config.bands;
    let mut lines = Vec::with_capacity(2 + config.max_weakness_recommendations);

    let band = if score < bands.foundational_below {
        FOUNDATIONAL
    } else if score < bands.advanced_from {
        PRACTICE
    } else {
        ADVANCED
    };
    lines.push(band.to_string());

    lines.extend(
        weaknesses
            .iter()
            .take(config.max_weakness_recommendations)
            .map(|w| format!("Review {}: average quiz score {}%.", w.topic, percent(w.score))),
    );

    if let Some(best) = strengths.first() {
        lines.push(format!(
            "Build on your strength in {} to tackle related topics.",
            best.topic
        ));
    }

    lines
}

fn percent(score: f64) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

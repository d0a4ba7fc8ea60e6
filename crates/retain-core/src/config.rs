//! Engine configuration
//!
//! All tunables load from one JSON document. Every field has a default, so
//! `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "scheduler": { "leitnerIntervals": [1, 3, 7, 14, 30, 90] },
//!   "mastery": { "weights": { "sr": 0.5, "quiz": 0.5, "review": 0.0 } }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mastery::MasteryConfig;
use crate::schedule::SchedulerParameters;

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for [`crate::StudyEngine`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub scheduler: SchedulerParameters,
    pub mastery: MasteryConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.as_ref().display(), "Loaded engine configuration");
        Ok(config)
    }

    /// Check ranges and orderings that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = &self.scheduler.leitner_intervals;
        if intervals.iter().any(|&days| days == 0) {
            return Err(invalid("leitnerIntervals must be at least 1 day"));
        }
        if intervals.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(invalid("leitnerIntervals must be non-decreasing"));
        }
        if self.scheduler.max_interval_days == 0 {
            return Err(invalid("maxIntervalDays must be at least 1"));
        }

        let mastery = &self.mastery;
        let weights = [mastery.weights.sr, mastery.weights.quiz, mastery.weights.review];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid("weights must be finite and non-negative"));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("weights must have a positive sum"));
        }

        if !(0.0..=1.0).contains(&mastery.recency_floor) {
            return Err(invalid("recencyFloor must be within [0, 1]"));
        }
        if mastery.recency_window_days.is_nan() || mastery.recency_window_days <= 0.0 {
            return Err(invalid("recencyWindowDays must be positive"));
        }
        if mastery.volume_saturation == 0 || mastery.topic_confidence_saturation == 0 {
            return Err(invalid("saturation counts must be at least 1"));
        }
        if !ordered(&[mastery.weakness_threshold, mastery.strength_threshold]) {
            return Err(invalid("weaknessThreshold must not exceed strengthThreshold"));
        }

        let bands = &mastery.bands;
        if !ordered(&[0.0, bands.foundational_below, bands.advanced_from, 1.0]) {
            return Err(invalid(
                "bands must satisfy 0 <= foundationalBelow <= advancedFrom <= 1",
            ));
        }

        Ok(())
    }
}

/// Non-decreasing and free of NaN
fn ordered(values: &[f64]) -> bool {
    values.iter().all(|v| !v.is_nan()) && values.windows(2).all(|pair| pair[0] <= pair[1])
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(reason.to_string())
}

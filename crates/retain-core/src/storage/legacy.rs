//! Persisted record shape
//!
//! Field names follow the long-standing on-disk format: `easiness_factor`,
//! `interval`, `repetitions`, `review_count`, `last_reviewed`,
//! `next_review`, and `box` for Leitner items. Older records carry no
//! algorithm tag, in which case the presence of `box` decides the policy.
//! New records always write the explicit `algorithm` tag as well.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Result, StorageError};
use crate::schedule::{
    Algorithm, AlgorithmKind, INITIAL_EASINESS, LeitnerState, MAX_LEITNER_BOX, MIN_EASINESS,
    ScheduleState, Sm2State,
};

/// One schedule state as persisted by the file and SQLite stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LegacyRecord {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub item_type: String,
    /// Explicit policy tag ("SM2" / "Leitner"); absent in older records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easiness_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(default)]
    pub review_count: u32,
    /// ISO-8601
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<String>,
    /// ISO-8601; absent means the item is never due
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<String>,
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub box_index: Option<u8>,
}

impl LegacyRecord {
    /// Resolve the scheduling policy of this record
    pub fn kind(&self) -> Result<AlgorithmKind> {
        let tagged = match &self.algorithm {
            Some(tag) => Some(
                tag.parse::<AlgorithmKind>()
                    .map_err(|e| self.invalid(&e))?,
            ),
            None => None,
        };

        match (tagged, self.box_index) {
            (Some(AlgorithmKind::Sm2), Some(_)) => {
                Err(self.invalid("SM2 record carries a Leitner box"))
            }
            (Some(kind), _) => Ok(kind),
            (None, Some(_)) => Ok(AlgorithmKind::Leitner),
            (None, None) => Ok(AlgorithmKind::Sm2),
        }
    }

    /// Convert into a validated schedule state
    pub fn into_state(self) -> Result<ScheduleState> {
        let algorithm = match self.kind()? {
            AlgorithmKind::Sm2 => {
                let easiness_factor = self.easiness_factor.unwrap_or(INITIAL_EASINESS);
                if !easiness_factor.is_finite() || easiness_factor < MIN_EASINESS {
                    return Err(self.invalid(&format!(
                        "easiness_factor {} below {}",
                        easiness_factor, MIN_EASINESS
                    )));
                }
                Algorithm::Sm2(Sm2State {
                    easiness_factor,
                    interval: self.interval.unwrap_or(0),
                    repetitions: self.repetitions.unwrap_or(0),
                })
            }
            AlgorithmKind::Leitner => {
                let box_index = self.box_index.unwrap_or(0);
                if box_index > MAX_LEITNER_BOX {
                    return Err(self.invalid(&format!("box {} above {}", box_index, MAX_LEITNER_BOX)));
                }
                Algorithm::Leitner(LeitnerState { box_index })
            }
        };

        let last_reviewed = self.last_reviewed.as_deref().map(parse_timestamp).transpose()?;
        let next_review = self.next_review.as_deref().map(parse_timestamp).transpose()?;

        Ok(ScheduleState {
            item_id: self.item_id,
            item_type: self.item_type,
            algorithm,
            review_count: self.review_count,
            last_reviewed,
            next_review,
        })
    }

    /// Persisted form of a state
    pub fn from_state(state: &ScheduleState) -> Self {
        let mut record = LegacyRecord {
            item_id: state.item_id.clone(),
            item_type: state.item_type.clone(),
            algorithm: Some(state.kind().to_string()),
            review_count: state.review_count,
            last_reviewed: state.last_reviewed.map(format_timestamp),
            next_review: state.next_review.map(format_timestamp),
            ..Default::default()
        };

        match &state.algorithm {
            Algorithm::Sm2(s) => {
                record.easiness_factor = Some(s.easiness_factor);
                record.interval = Some(s.interval);
                record.repetitions = Some(s.repetitions);
            }
            Algorithm::Leitner(s) => {
                record.box_index = Some(s.box_index);
            }
        }

        record
    }

    fn invalid(&self, reason: &str) -> StorageError {
        StorageError::InvalidRecord(format!("{}/{}: {}", self.item_type, self.item_id, reason))
    }
}

impl TryFrom<LegacyRecord> for ScheduleState {
    type Error = StorageError;

    fn try_from(record: LegacyRecord) -> Result<Self> {
        record.into_state()
    }
}

impl From<&ScheduleState> for LegacyRecord {
    fn from(state: &ScheduleState) -> Self {
        LegacyRecord::from_state(state)
    }
}

/// Fixed-width RFC 3339 in UTC, so stored timestamps sort lexically
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse ISO-8601: RFC 3339 with an offset, or a naive timestamp taken as UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| StorageError::InvalidRecord(format!("Invalid timestamp '{}'", value)))
}

//! Scheduling State - one value per learnable item
//!
//! Each item carries either SM-2 or Leitner bookkeeping, never both.
//! The algorithm is an explicit tagged variant so the two branches are
//! mutually exclusive at the type level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Lowest quality rating (total blackout)
pub const MIN_QUALITY: u8 = 0;

/// Highest quality rating (perfect recall)
pub const MAX_QUALITY: u8 = 5;

/// Ratings at or above this value count as a successful recall
pub const PASSING_QUALITY: u8 = 3;

/// Easiness factor assigned to new SM-2 items
pub const INITIAL_EASINESS: f64 = 2.5;

/// SM-2 easiness factor floor
pub const MIN_EASINESS: f64 = 1.3;

/// Highest Leitner box index
pub const MAX_LEITNER_BOX: u8 = 5;

/// Number of Leitner boxes (0..=MAX_LEITNER_BOX)
pub const LEITNER_BOXES: usize = MAX_LEITNER_BOX as usize + 1;

/// Repetition count at which the SM-2 repetition component saturates
pub const SM2_REPETITION_SATURATION: f64 = 10.0;

// ============================================================================
// QUALITY RATING
// ============================================================================

/// Learner's self-reported recall quality, 0 (forgot) to 5 (perfect).
///
/// Any input is clamped into range rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Every rating, worst to best
    pub const ALL: [Quality; 6] = [
        Quality(0),
        Quality(1),
        Quality(2),
        Quality(3),
        Quality(4),
        Quality(5),
    ];

    /// Create a rating, clamping into 0..=5
    pub fn new(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY)) as u8)
    }

    /// Raw rating value
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the rating counts as a successful recall
    #[inline]
    pub fn is_pass(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    /// Rating scaled into [0, 1]
    #[inline]
    pub fn normalized(self) -> f64 {
        f64::from(self.0) / f64::from(MAX_QUALITY)
    }
}

impl From<i64> for Quality {
    fn from(value: i64) -> Self {
        Quality::new(value)
    }
}

impl From<i32> for Quality {
    fn from(value: i32) -> Self {
        Quality::new(i64::from(value))
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Quality(value.min(MAX_QUALITY))
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ALGORITHM
// ============================================================================

/// Which scheduling policy an item follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AlgorithmKind {
    /// SuperMemo-2
    #[default]
    #[serde(rename = "SM2")]
    Sm2,
    /// Leitner boxes
    Leitner,
}

impl AlgorithmKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::Sm2 => "SM2",
            AlgorithmKind::Leitner => "Leitner",
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AlgorithmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sm2" | "sm-2" => Ok(AlgorithmKind::Sm2),
            "leitner" => Ok(AlgorithmKind::Leitner),
            _ => Err(format!("Unknown scheduling algorithm: {}", s)),
        }
    }
}

/// SM-2 bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sm2State {
    /// Easiness factor, never below 1.3
    pub easiness_factor: f64,
    /// Days until the next review
    pub interval: u32,
    /// Consecutive successful reviews
    pub repetitions: u32,
}

impl Default for Sm2State {
    fn default() -> Self {
        Self {
            easiness_factor: INITIAL_EASINESS,
            interval: 0,
            repetitions: 0,
        }
    }
}

/// Leitner bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeitnerState {
    /// Current box, 0..=5
    #[serde(rename = "box")]
    pub box_index: u8,
}

/// Algorithm-specific state, tagged by policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Algorithm {
    /// SuperMemo-2 state
    #[serde(rename = "SM2")]
    Sm2(Sm2State),
    /// Leitner box state
    Leitner(LeitnerState),
}

impl Algorithm {
    /// Fresh state for a policy
    pub fn initial(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::Sm2 => Algorithm::Sm2(Sm2State::default()),
            AlgorithmKind::Leitner => Algorithm::Leitner(LeitnerState::default()),
        }
    }

    /// Policy tag
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::Sm2(_) => AlgorithmKind::Sm2,
            Algorithm::Leitner(_) => AlgorithmKind::Leitner,
        }
    }
}

// ============================================================================
// ITEM IDENTITY
// ============================================================================

/// Identity of a learnable item as the storage layer sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub item_id: String,
    pub item_type: String,
}

impl ItemKey {
    pub fn new(item_id: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            item_type: item_type.into(),
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.item_type, self.item_id)
    }
}

// ============================================================================
// SCHEDULE STATE
// ============================================================================

/// Scheduling state for one item.
///
/// Values are never mutated in place by the scheduler; every review
/// produces a fresh `ScheduleState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    /// Item identifier
    pub item_id: String,
    /// Item category (flashcard, note, topic, ...)
    pub item_type: String,
    /// Policy-specific state
    pub algorithm: Algorithm,
    /// Total reviews recorded, never decreases
    pub review_count: u32,
    /// When the item was last reviewed
    pub last_reviewed: Option<DateTime<Utc>>,
    /// When the item is next due; `None` means it is never due
    pub next_review: Option<DateTime<Utc>>,
}

impl ScheduleState {
    /// Initial state for an item seen for the first time.
    ///
    /// This is the only place the defaults live: EF 2.5 / interval 0 /
    /// repetitions 0 for SM-2, box 0 for Leitner, due immediately.
    pub fn new(
        item_id: impl Into<String>,
        item_type: impl Into<String>,
        kind: AlgorithmKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            item_type: item_type.into(),
            algorithm: Algorithm::initial(kind),
            review_count: 0,
            last_reviewed: None,
            next_review: Some(now),
        }
    }

    /// Initial state for a storage key
    pub fn for_key(key: &ItemKey, kind: AlgorithmKind, now: DateTime<Utc>) -> Self {
        Self::new(key.item_id.clone(), key.item_type.clone(), kind, now)
    }

    /// Storage key of this item
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.item_id.clone(), self.item_type.clone())
    }

    /// Policy tag
    pub fn kind(&self) -> AlgorithmKind {
        self.algorithm.kind()
    }

    /// SM-2 state, if this item uses SM-2
    pub fn sm2(&self) -> Option<&Sm2State> {
        match &self.algorithm {
            Algorithm::Sm2(s) => Some(s),
            Algorithm::Leitner(_) => None,
        }
    }

    /// Leitner state, if this item uses Leitner boxes
    pub fn leitner(&self) -> Option<&LeitnerState> {
        match &self.algorithm {
            Algorithm::Leitner(s) => Some(s),
            Algorithm::Sm2(_) => None,
        }
    }

    /// Whether the item is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_some_and(|due| due <= now)
    }

    /// Normalized progress in [0, 1] used as the scheduling evidence for mastery.
    ///
    /// SM-2: mean of `(EF - 1.3) / 1.2` and `repetitions / 10`, each clamped.
    /// Leitner: `box / 5`.
    pub fn normalized_score(&self) -> f64 {
        match &self.algorithm {
            Algorithm::Sm2(s) => {
                let ease = ((s.easiness_factor - MIN_EASINESS) / (INITIAL_EASINESS - MIN_EASINESS))
                    .clamp(0.0, 1.0);
                let reps = (f64::from(s.repetitions) / SM2_REPETITION_SATURATION).min(1.0);
                let score = (ease + reps) / 2.0;
                if score.is_finite() { score } else { 0.0 }
            }
            Algorithm::Leitner(s) => {
                f64::from(s.box_index.min(MAX_LEITNER_BOX)) / f64::from(MAX_LEITNER_BOX)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

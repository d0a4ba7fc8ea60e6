//! Question type distribution for quiz requests

use serde::{Deserialize, Serialize};

/// Kinds of quiz question the content generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "open_ended")]
    OpenEnded,
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "fill_blank")]
    FillBlank,
}

impl QuestionType {
    /// Default mix, in round-robin order
    pub const ALL: [QuestionType; 3] = [
        QuestionType::OpenEnded,
        QuestionType::MultipleChoice,
        QuestionType::FillBlank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::OpenEnded => "open_ended",
            QuestionType::MultipleChoice => "mcq",
            QuestionType::FillBlank => "fill_blank",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open_ended" | "open-ended" => Ok(QuestionType::OpenEnded),
            "mcq" | "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "fill_blank" | "fill-blank" => Ok(QuestionType::FillBlank),
            _ => Err(format!("Unknown question type: {}", s)),
        }
    }
}

/// Number of questions of one type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypeCount {
    pub question_type: QuestionType,
    pub count: u32,
}

/// Deal `count` questions round-robin across `question_types`.
///
/// Order is preserved and every supplied type is listed, possibly with a
/// zero count. 5 over `[open_ended, mcq, fill_blank]` gives 2/2/1.
pub fn distribute(count: u32, question_types: &[QuestionType]) -> Vec<QuestionTypeCount> {
    let Ok(n) = u32::try_from(question_types.len()) else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }

    let base = count / n;
    let remainder = count % n;

    question_types
        .iter()
        .zip(0u32..)
        .map(|(&question_type, position)| QuestionTypeCount {
            question_type,
            count: base + u32::from(position < remainder),
        })
        .collect()
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseKindError {
    #[error("unknown question kind: {0}")]
    Kind(String),
    #[error("unknown difficulty: {0}")]
    Difficulty(String),
}

//
// ─── QUESTION KIND ────────────────────────────────────────────────────────────
//

/// Format of a generated question set.
///
/// The kind gates which inputs are accepted and whether the set is graded:
/// - `Short`: free-text prompts reviewed by revealing the answer, never scored
/// - `MultipleChoice`: lettered options, timed and scored
/// - `TrueFalse`: binary answer, timed and scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[default]
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "mcq", alias = "multipleChoice")]
    MultipleChoice,
    #[serde(rename = "truefalse", alias = "trueFalse")]
    TrueFalse,
}

impl QuestionKind {
    /// Name used by the generation API.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            QuestionKind::Short => "short",
            QuestionKind::MultipleChoice => "mcq",
            QuestionKind::TrueFalse => "truefalse",
        }
    }

    /// Whether each question runs on a countdown.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::TrueFalse)
    }

    /// Whether finishing the set produces a score.
    #[must_use]
    pub fn is_scored(self) -> bool {
        self.is_timed()
    }

    /// Whether the reveal toggle applies.
    #[must_use]
    pub fn supports_reveal(self) -> bool {
        matches!(self, QuestionKind::Short | QuestionKind::TrueFalse)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for QuestionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "mcq" | "multiplechoice" => Ok(Self::MultipleChoice),
            "truefalse" | "true_false" | "tf" => Ok(Self::TrueFalse),
            _ => Err(ParseKindError::Kind(s.to_string())),
        }
    }
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseKindError::Difficulty(s.to_string())),
        }
    }
}

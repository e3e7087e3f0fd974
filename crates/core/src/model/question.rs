use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::kind::QuestionKind;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("multiple-choice question has no options")]
    MissingOptions,

    #[error("option {0} appears more than once")]
    DuplicateOption(OptionLabel),

    #[error("correct answer {answer:?} does not name any option")]
    UnknownCorrectOption { answer: String },

    #[error("true/false answer must be \"true\" or \"false\", got {0:?}")]
    InvalidTrueFalseAnswer(String),

    #[error("{0} options supplied, at most four can be labeled")]
    TooManyOptions(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid option label: {0:?}")]
pub struct OptionLabelError(pub String);

//
// ─── OPTION LABEL ─────────────────────────────────────────────────────────────
//

/// Letter identifying a multiple-choice option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Parses a letter, ignoring case.
    #[must_use]
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Maps the 1-based digit shortcut (`1` → `A` … `4` → `D`).
    #[must_use]
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::A),
            '2' => Some(Self::B),
            '3' => Some(Self::C),
            '4' => Some(Self::D),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    /// Parses a label from text such as `"b"` or `" C "`.
    ///
    /// # Errors
    ///
    /// Returns `OptionLabelError` unless the trimmed text is a single letter A–D.
    pub fn parse(raw: &str) -> Result<Self, OptionLabelError> {
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c).ok_or_else(|| OptionLabelError(raw.into())),
            _ => Err(OptionLabelError(raw.into())),
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub label: OptionLabel,
    pub text: String,
}

impl QuizOption {
    #[must_use]
    pub fn new(label: OptionLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single generated prompt with its canonical answer.
///
/// Construction validates the kind-specific shape, so a `Question` in hand
/// always satisfies:
/// - multiple choice: options are non-empty and `correct_answer` is one of their labels
/// - true/false: `correct_answer` is `"true"` or `"false"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    options: Vec<QuizOption>,
    correct_answer: String,
    explanation: Option<String>,
}

impl Question {
    /// Builds a question of the given kind.
    ///
    /// `options` are dropped for kinds other than multiple choice.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or the answer does not fit the kind.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        prompt: impl Into<String>,
        options: Vec<QuizOption>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        match kind {
            QuestionKind::Short => Self::short(id, prompt, correct_answer),
            QuestionKind::MultipleChoice => {
                Self::multiple_choice(id, prompt, options, correct_answer)
            }
            QuestionKind::TrueFalse => Self::true_false(id, prompt, correct_answer),
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` if the prompt is blank.
    pub fn short(
        id: QuestionId,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        Ok(Self {
            id,
            kind: QuestionKind::Short,
            prompt: validate_prompt(prompt.into())?,
            options: Vec::new(),
            correct_answer: answer.into().trim().to_string(),
            explanation: None,
        })
    }

    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, options are missing or
    /// duplicated, or the correct answer is not one of the option labels.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<QuizOption>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = validate_prompt(prompt.into())?;
        if options.is_empty() {
            return Err(QuestionError::MissingOptions);
        }
        for (i, option) in options.iter().enumerate() {
            if options[..i].iter().any(|prev| prev.label == option.label) {
                return Err(QuestionError::DuplicateOption(option.label));
            }
        }

        let raw = correct_answer.into();
        let label = OptionLabel::parse(&raw)
            .ok()
            .filter(|label| options.iter().any(|o| o.label == *label))
            .ok_or(QuestionError::UnknownCorrectOption { answer: raw })?;

        Ok(Self {
            id,
            kind: QuestionKind::MultipleChoice,
            prompt,
            options,
            correct_answer: label.as_str().to_string(),
            explanation: None,
        })
    }

    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or the answer is not a boolean word.
    pub fn true_false(
        id: QuestionId,
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = validate_prompt(prompt.into())?;
        let raw = correct_answer.into();
        let normalized = match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" => "true",
            "false" | "f" => "false",
            _ => return Err(QuestionError::InvalidTrueFalseAnswer(raw)),
        };

        Ok(Self {
            id,
            kind: QuestionKind::TrueFalse,
            prompt,
            options: Vec::new(),
            correct_answer: normalized.to_string(),
            explanation: None,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, label: OptionLabel) -> bool {
        self.options.iter().any(|o| o.label == label)
    }

    /// Compares a submitted answer against the canonical one, ignoring case
    /// and surrounding whitespace.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(&self.correct_answer)
    }
}

fn validate_prompt(prompt: String) -> Result<String, QuestionError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(QuestionError::EmptyPrompt);
    }
    Ok(trimmed.to_string())
}

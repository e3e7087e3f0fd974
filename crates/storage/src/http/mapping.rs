use quiz_core::model::{
    OptionLabel, Question, QuestionError, QuestionId, QuestionKind, QuizOption, QuizResult,
};
use serde::{Deserialize, Serialize};

use crate::repository::ApiError;

/// Generation responses come back either as a bare array or wrapped in
/// `{ "questions": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum GenerationResponse {
    List(Vec<QuestionRecord>),
    Wrapped { questions: Vec<QuestionRecord> },
}

impl GenerationResponse {
    pub(crate) fn into_records(self) -> Vec<QuestionRecord> {
        match self {
            GenerationResponse::List(records) | GenerationResponse::Wrapped { questions: records } => {
                records
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordId {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AnswerValue {
    Text(String),
    Flag(bool),
}

impl AnswerValue {
    fn into_text(self) -> String {
        match self {
            AnswerValue::Text(text) => text,
            AnswerValue::Flag(flag) => flag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OptionRecord {
    Labeled { label: String, text: String },
    Plain(String),
}

/// Question as returned by the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(alias = "prompt")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
    #[serde(alias = "correctAnswer")]
    pub answer: AnswerValue,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    /// Validate and convert into a domain `Question` of the requested kind.
    ///
    /// Missing or blank ids are replaced with a freshly generated one.
    pub(crate) fn into_question(self, kind: QuestionKind) -> Result<Question, QuestionError> {
        let id = self
            .id
            .and_then(|id| match id {
                RecordId::Text(text) => QuestionId::new(text).ok(),
                RecordId::Number(n) => QuestionId::new(n.to_string()).ok(),
            })
            .unwrap_or_else(QuestionId::generate);

        let options = if kind == QuestionKind::MultipleChoice {
            map_options(self.options)?
        } else {
            Vec::new()
        };

        Ok(Question::new(id, kind, self.question, options, self.answer.into_text())?
            .with_explanation(self.explanation))
    }
}

fn map_options(records: Vec<OptionRecord>) -> Result<Vec<QuizOption>, QuestionError> {
    if records.len() > OptionLabel::ALL.len() {
        return Err(QuestionError::TooManyOptions(records.len()));
    }
    Ok(records
        .into_iter()
        .zip(OptionLabel::ALL)
        .map(|(record, positional)| match record {
            OptionRecord::Labeled { label, text } => {
                let label = OptionLabel::parse(&label).unwrap_or(positional);
                QuizOption::new(label, text.trim())
            }
            OptionRecord::Plain(raw) => split_plain_option(&raw, positional),
        })
        .collect())
}

/// Splits `"B) Venus"` into label `B` and text `Venus`. Only an upper-case
/// leading letter counts, so `"a cell wall"` keeps its position as label.
fn split_plain_option(raw: &str, positional: OptionLabel) -> QuizOption {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let label = match (chars.next(), chars.next()) {
        (Some(first), Some(')' | '.' | ':' | ' ')) if first.is_ascii_uppercase() => {
            OptionLabel::from_letter(first)
        }
        _ => None,
    };
    match label {
        Some(label) => QuizOption::new(label, chars.as_str().trim()),
        None => QuizOption::new(positional, trimmed),
    }
}

/// Converts a whole response, failing on the first invalid record.
pub(crate) fn into_questions(
    records: Vec<QuestionRecord>,
    kind: QuestionKind,
) -> Result<Vec<Question>, ApiError> {
    if records.is_empty() {
        return Err(ApiError::EmptyResponse);
    }
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_question(kind)
                .map_err(|source| ApiError::InvalidQuestion { index, source })
        })
        .collect()
}

/// Body of a result persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultRecord {
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub kind: QuestionKind,
    pub difficulty: quiz_core::model::Difficulty,
}

impl ResultRecord {
    pub(crate) fn from_result(result: &QuizResult) -> Self {
        Self {
            topic: result.topic.clone(),
            score: result.score,
            total_questions: result.total_questions,
            percentage: result.percentage,
            kind: result.kind,
            difficulty: result.difficulty,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Stable identifier for a generated question.
///
/// Generators may supply their own id; when they don't, one is minted
/// client-side with [`QuestionId::generate`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Wraps an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Mints a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing a `QuestionId` from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question id must not be blank")
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_trims_input() {
        let id: QuestionId = "  q-1 ".parse().unwrap();
        assert_eq!(id.as_str(), "q-1");
        assert_eq!(id.to_string(), "q-1");
    }

    #[test]
    fn blank_question_id_is_rejected() {
        assert_eq!("   ".parse::<QuestionId>(), Err(ParseIdError));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(QuestionId::generate(), QuestionId::generate());
    }
}

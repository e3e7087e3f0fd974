//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuestionKind;
use storage::ApiError;

/// Errors emitted while requesting a question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("please enter a topic to generate questions")]
    EmptyTopic,
    #[error("a question set is already being generated")]
    InFlight,
    #[error("expected {expected} questions, generator returned {found}")]
    KindMismatch {
        expected: QuestionKind,
        found: QuestionKind,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while saving a finished quiz.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("quiz is not completed")]
    NotCompleted,
    #[error(transparent)]
    Api(#[from] ApiError),
}

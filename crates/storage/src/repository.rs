use async_trait::async_trait;
use quiz_core::model::{Difficulty, Question, QuestionError, QuestionKind, QuizResult};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::http::{HttpQuizApi, QuizApiConfig};
use crate::user::UserContext;

/// Errors surfaced by quiz API adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("quiz api is not configured")]
    NotConfigured,

    #[error("not authorized (status {0})")]
    Unauthorized(reqwest::StatusCode),

    #[error("quiz api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("quiz api returned no questions")]
    EmptyResponse,

    #[error("generated question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Body of a question generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
    pub count: u32,
    pub language: String,
}

/// Produces an ordered question set for a topic.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Request a fresh question set.
    ///
    /// Implementations return either the complete, validated set or an error;
    /// never a partial list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-success statuses, or
    /// malformed question records.
    async fn generate(
        &self,
        user: &UserContext,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, ApiError>;
}

/// Persists the outcome of a finished quiz.
#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` if the result could not be stored.
    async fn record_result(&self, user: &UserContext, result: &QuizResult)
    -> Result<(), ApiError>;
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    queued: VecDeque<Result<Vec<Question>, String>>,
    fallback: Vec<Question>,
    record_failures: VecDeque<String>,
    generation_requests: Vec<GenerationRequest>,
    results: Vec<(UserContext, QuizResult)>,
}

/// Scripted quiz API for tests and offline runs.
///
/// Generation pops queued responses in FIFO order. Once the queue is empty it
/// serves the default questions of the requested kind. Every call is logged.
#[derive(Clone, Default)]
pub struct InMemoryQuizApi {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryQuizApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Questions served when nothing is queued, filtered by requested kind.
    #[must_use]
    pub fn with_default_questions(self, questions: Vec<Question>) -> Self {
        if let Ok(mut guard) = self.state.lock() {
            guard.fallback = questions;
        }
        self
    }

    pub fn push_questions(&self, questions: Vec<Question>) {
        if let Ok(mut guard) = self.state.lock() {
            guard.queued.push_back(Ok(questions));
        }
    }

    pub fn push_generation_failure(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.state.lock() {
            guard.queued.push_back(Err(message.into()));
        }
    }

    pub fn fail_next_record(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.state.lock() {
            guard.record_failures.push_back(message.into());
        }
    }

    #[must_use]
    pub fn generation_requests(&self) -> Vec<GenerationRequest> {
        self.state
            .lock()
            .map(|guard| guard.generation_requests.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn recorded_results(&self) -> Vec<QuizResult> {
        self.state
            .lock()
            .map(|guard| guard.results.iter().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn recorded_users(&self) -> Vec<UserContext> {
        self.state
            .lock()
            .map(|guard| guard.results.iter().map(|(u, _)| u.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuestionGenerator for InMemoryQuizApi {
    async fn generate(
        &self,
        _user: &UserContext,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, ApiError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        guard.generation_requests.push(request.clone());

        let next: Vec<Question> = match guard.queued.pop_front() {
            Some(next) => next.map_err(ApiError::Connection)?,
            None => guard
                .fallback
                .iter()
                .filter(|q| q.kind() == request.kind)
                .cloned()
                .collect(),
        };

        if next.is_empty() {
            return Err(ApiError::EmptyResponse);
        }
        Ok(next)
    }
}

#[async_trait]
impl ResultRecorder for InMemoryQuizApi {
    async fn record_result(
        &self,
        user: &UserContext,
        result: &QuizResult,
    ) -> Result<(), ApiError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        if let Some(message) = guard.record_failures.pop_front() {
            return Err(ApiError::Connection(message));
        }
        guard.results.push((user.clone(), result.clone()));
        Ok(())
    }
}

/// Both collaborators behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct QuizApi {
    pub generator: Arc<dyn QuestionGenerator>,
    pub recorder: Arc<dyn ResultRecorder>,
}

impl QuizApi {
    #[must_use]
    pub fn in_memory(api: InMemoryQuizApi) -> Self {
        let generator: Arc<dyn QuestionGenerator> = Arc::new(api.clone());
        let recorder: Arc<dyn ResultRecorder> = Arc::new(api);
        Self {
            generator,
            recorder,
        }
    }

    /// REST-backed collaborators.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn http(config: QuizApiConfig) -> Result<Self, ApiError> {
        let api = HttpQuizApi::new(config)?;
        let generator: Arc<dyn QuestionGenerator> = Arc::new(api.clone());
        let recorder: Arc<dyn ResultRecorder> = Arc::new(api);
        Ok(Self {
            generator,
            recorder,
        })
    }
}

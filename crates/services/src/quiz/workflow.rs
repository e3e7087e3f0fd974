use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Difficulty, Question, QuestionKind};
use storage::{ApiError, GenerationRequest, QuestionGenerator, QuizApi, ResultRecorder, UserContext};

use super::service::{ActionOutcome, GenerationTicket, NavOutcome, QuizSession, TickOutcome};
use super::countdown::TimerEpoch;
use super::input::QuizAction;
use crate::error::{GenerationError, PersistenceError};
use crate::settings::QuizSettings;

/// What the learner asked for on the generation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationForm {
    pub topic: String,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
}

impl GenerationForm {
    #[must_use]
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, kind: QuestionKind) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            kind,
        }
    }
}

/// How a generation response was applied to the session.
#[derive(Debug)]
pub enum GenerationOutcome {
    Loaded { count: usize },
    Failed(GenerationError),
    /// The session moved on before the response arrived.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOutcome {
    Saved,
    AlreadySaved,
}

/// An engine step together with the save attempt it triggered, if any.
#[derive(Debug)]
pub struct AdvanceResult<T> {
    pub outcome: T,
    pub persistence: Option<Result<PersistenceOutcome, PersistenceError>>,
}

/// Drives generation and result persistence around a `QuizSession`.
#[derive(Clone)]
pub struct QuizLoopService {
    settings: QuizSettings,
    clock: Clock,
    user: UserContext,
    generator: Arc<dyn QuestionGenerator>,
    recorder: Arc<dyn ResultRecorder>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(settings: QuizSettings, clock: Clock, user: UserContext, api: QuizApi) -> Self {
        Self {
            settings,
            clock,
            user,
            generator: api.generator,
            recorder: api.recorder,
        }
    }

    #[must_use]
    pub fn new_session(&self) -> QuizSession {
        QuizSession::new(&self.settings, self.clock)
    }

    //
    // ─── GENERATION ─────────────────────────────────────────────────────────
    //

    /// Validate the form and put the session into the generating state.
    ///
    /// The session is reset to idle with the form's topic, kind and
    /// difficulty. The returned ticket must accompany the response.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyTopic` for a blank topic and
    /// `GenerationError::InFlight` while another request is pending.
    pub fn begin_generation(
        &self,
        session: &mut QuizSession,
        form: GenerationForm,
    ) -> Result<(GenerationTicket, GenerationRequest), GenerationError> {
        let topic = form.topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::EmptyTopic);
        }
        if session.is_generating() {
            return Err(GenerationError::InFlight);
        }

        session.set_kind(form.kind);
        session.reset();
        session.set_topic(topic);
        session.set_difficulty(form.difficulty);
        let ticket = session.issue_ticket();

        let request = GenerationRequest {
            topic: topic.to_string(),
            difficulty: form.difficulty,
            kind: form.kind,
            count: self.settings.question_count(),
            language: self.settings.language().to_string(),
        };
        tracing::debug!(topic = %request.topic, kind = %request.kind, "generation started");
        Ok((ticket, request))
    }

    /// Call the generator for a prepared request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` from the generator.
    pub async fn request_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, ApiError> {
        self.generator.generate(&self.user, request).await
    }

    /// Apply a generation response if its ticket is still current.
    pub fn complete_generation(
        &self,
        session: &mut QuizSession,
        ticket: GenerationTicket,
        result: Result<Vec<Question>, ApiError>,
    ) -> GenerationOutcome {
        if !session.redeem_ticket(ticket) {
            tracing::debug!(?ticket, "discarding stale generation response");
            return GenerationOutcome::Discarded;
        }
        match accept_questions(session, result) {
            Ok(count) => GenerationOutcome::Loaded { count },
            Err(err) => GenerationOutcome::Failed(err),
        }
    }

    /// Run a whole generation round inline.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` for validation or generator failures. The
    /// session stays idle on failure.
    pub async fn generate(
        &self,
        session: &mut QuizSession,
        form: GenerationForm,
    ) -> Result<usize, GenerationError> {
        let (ticket, request) = self.begin_generation(session, form)?;
        let result = self.request_questions(&request).await;
        session.redeem_ticket(ticket);
        accept_questions(session, result)
    }

    //
    // ─── ANSWERING & PERSISTENCE ────────────────────────────────────────────
    //

    /// Apply an action and persist the result when it finishes the quiz.
    pub async fn apply(
        &self,
        session: &mut QuizSession,
        action: QuizAction,
    ) -> AdvanceResult<ActionOutcome> {
        let outcome = session.apply(action);
        let completed = matches!(outcome, ActionOutcome::Navigated(NavOutcome::Completed(_)));
        self.advance_result(session, outcome, completed).await
    }

    /// Feed a countdown tick and persist the result when expiry finishes the quiz.
    pub async fn tick(
        &self,
        session: &mut QuizSession,
        epoch: TimerEpoch,
    ) -> AdvanceResult<TickOutcome> {
        let outcome = session.tick(epoch);
        let completed = matches!(outcome, TickOutcome::Advanced(NavOutcome::Completed(_)));
        self.advance_result(session, outcome, completed).await
    }

    async fn advance_result<T>(
        &self,
        session: &mut QuizSession,
        outcome: T,
        completed: bool,
    ) -> AdvanceResult<T> {
        let persistence = if completed {
            Some(self.finalize_result(session).await)
        } else {
            None
        };
        AdvanceResult {
            outcome,
            persistence,
        }
    }

    /// Save the completed result. Safe to call again after a failure.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotCompleted` before completion, or
    /// `PersistenceError::Api` if the recorder fails. The session keeps its
    /// score either way.
    pub async fn finalize_result(
        &self,
        session: &mut QuizSession,
    ) -> Result<PersistenceOutcome, PersistenceError> {
        let Some(result) = session.result().cloned() else {
            return Err(PersistenceError::NotCompleted);
        };
        if session.is_result_saved() {
            return Ok(PersistenceOutcome::AlreadySaved);
        }

        if let Err(err) = self.recorder.record_result(&self.user, &result).await {
            tracing::warn!(error = %err, topic = %result.topic, "failed to save quiz result");
            return Err(err.into());
        }
        session.mark_result_saved();
        tracing::info!(
            topic = %result.topic,
            score = result.score,
            total = result.total_questions,
            "quiz result recorded"
        );
        Ok(PersistenceOutcome::Saved)
    }
}

fn accept_questions(
    session: &mut QuizSession,
    result: Result<Vec<Question>, ApiError>,
) -> Result<usize, GenerationError> {
    let questions = match result {
        Ok(questions) => questions,
        Err(err) => {
            tracing::warn!(error = %err, "question generation failed");
            return Err(err.into());
        }
    };
    if questions.is_empty() {
        return Err(ApiError::EmptyResponse.into());
    }
    let expected = session.kind();
    if let Some(found) = questions.iter().map(Question::kind).find(|kind| *kind != expected) {
        tracing::warn!(%expected, %found, "generator returned the wrong question kind");
        return Err(GenerationError::KindMismatch { expected, found });
    }

    let count = questions.len();
    session.load(questions);
    Ok(count)
}

use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Question, QuestionKind, QuizResult};
use storage::ApiError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::countdown::TimerEpoch;
use super::input::{InputEvent, InputRouter};
use super::service::{ActionOutcome, GenerationTicket, NavOutcome, QuizSession, TickOutcome};
use super::task::CountdownTask;
use super::workflow::{GenerationForm, GenerationOutcome, PersistenceOutcome, QuizLoopService};
use crate::error::PersistenceError;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything that can happen to a running quiz, funneled through one queue.
#[derive(Debug)]
pub enum QuizEvent {
    Input(InputEvent),
    Tick(TimerEpoch),
    Generate(GenerationForm),
    Generated {
        ticket: GenerationTicket,
        result: Result<Vec<Question>, ApiError>,
    },
    StartNewQuiz,
    SetKind(QuestionKind),
    SetVisible(bool),
    RetrySave,
    Shutdown,
}

/// User-facing consequences of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizNotice {
    GenerationStarted,
    QuestionsReady { count: usize },
    GenerationFailed(String),
    GenerationDiscarded,
    AnswerRecorded { index: usize },
    Moved { index: usize },
    RevealToggled { revealed: bool },
    Countdown { remaining: u32 },
    TimeExpired,
    /// A short-answer set looped back to its first question.
    ShortSetFinished,
    Completed(QuizResult),
    ResultSaved,
    PersistenceFailed(String),
    Reset,
}

/// Single-consumer event loop around a `QuizSession`.
///
/// Input, countdown ticks and generation responses are applied strictly one
/// at a time. After each event the countdown task is reconciled with the
/// session so that at most one ticker is alive.
pub struct QuizRunner {
    session: QuizSession,
    service: Arc<QuizLoopService>,
    events_tx: UnboundedSender<QuizEvent>,
    events_rx: UnboundedReceiver<QuizEvent>,
    countdown: Option<CountdownTask>,
}

impl QuizRunner {
    #[must_use]
    pub fn new(service: Arc<QuizLoopService>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session: service.new_session(),
            service,
            events_tx,
            events_rx,
            countdown: None,
        }
    }

    /// Handle for feeding events from other tasks.
    #[must_use]
    pub fn sender(&self) -> UnboundedSender<QuizEvent> {
        self.events_tx.clone()
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn has_active_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    /// Wait for the next queued event and apply it.
    ///
    /// Returns `None` on `QuizEvent::Shutdown`.
    pub async fn process_next(&mut self) -> Option<Vec<QuizNotice>> {
        let event = self.events_rx.recv().await?;
        if matches!(event, QuizEvent::Shutdown) {
            self.countdown = None;
            return None;
        }
        Some(self.handle(event).await)
    }

    /// Apply one event to the session. Must run inside a Tokio runtime.
    pub async fn handle(&mut self, event: QuizEvent) -> Vec<QuizNotice> {
        let mut notices = Vec::new();
        match event {
            QuizEvent::Input(input) => {
                if let Some(action) = InputRouter::route(&self.session, input) {
                    let step = self.service.apply(&mut self.session, action).await;
                    self.action_notices(step.outcome, &mut notices);
                    persistence_notices(step.persistence, &mut notices);
                }
            }
            QuizEvent::Tick(epoch) => {
                let step = self.service.tick(&mut self.session, epoch).await;
                match step.outcome {
                    TickOutcome::Ignored => {}
                    TickOutcome::Counting(remaining) => {
                        notices.push(QuizNotice::Countdown { remaining });
                    }
                    TickOutcome::Advanced(nav) => {
                        notices.push(QuizNotice::TimeExpired);
                        self.nav_notices(nav, &mut notices);
                    }
                }
                persistence_notices(step.persistence, &mut notices);
            }
            QuizEvent::Generate(form) => self.start_generation(form, &mut notices),
            QuizEvent::Generated { ticket, result } => {
                let outcome = self
                    .service
                    .complete_generation(&mut self.session, ticket, result);
                notices.push(match outcome {
                    GenerationOutcome::Loaded { count } => QuizNotice::QuestionsReady { count },
                    GenerationOutcome::Failed(err) => QuizNotice::GenerationFailed(err.to_string()),
                    GenerationOutcome::Discarded => QuizNotice::GenerationDiscarded,
                });
            }
            QuizEvent::StartNewQuiz => {
                self.session.reset();
                notices.push(QuizNotice::Reset);
            }
            QuizEvent::SetKind(kind) => {
                if kind != self.session.kind() {
                    self.session.set_kind(kind);
                    notices.push(QuizNotice::Reset);
                }
            }
            QuizEvent::SetVisible(visible) => self.session.set_visible(visible),
            QuizEvent::RetrySave => {
                let saved = self.service.finalize_result(&mut self.session).await;
                persistence_notices(Some(saved), &mut notices);
            }
            QuizEvent::Shutdown => {
                self.countdown = None;
                return notices;
            }
        }
        self.sync_countdown();
        notices
    }

    fn start_generation(&mut self, form: GenerationForm, notices: &mut Vec<QuizNotice>) {
        let (ticket, request) = match self.service.begin_generation(&mut self.session, form) {
            Ok(prepared) => prepared,
            Err(err) => {
                notices.push(QuizNotice::GenerationFailed(err.to_string()));
                return;
            }
        };

        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = service.request_questions(&request).await;
            if events.send(QuizEvent::Generated { ticket, result }).is_err() {
                tracing::debug!("quiz runner gone before generation finished");
            }
        });
        notices.push(QuizNotice::GenerationStarted);
    }

    fn action_notices(&self, outcome: ActionOutcome, notices: &mut Vec<QuizNotice>) {
        match outcome {
            ActionOutcome::AnswerRecorded { index } => {
                notices.push(QuizNotice::AnswerRecorded { index });
            }
            ActionOutcome::Navigated(nav) => self.nav_notices(nav, notices),
            ActionOutcome::RevealToggled { revealed } => {
                notices.push(QuizNotice::RevealToggled { revealed });
            }
            ActionOutcome::Ignored => {}
        }
    }

    fn nav_notices(&self, outcome: NavOutcome, notices: &mut Vec<QuizNotice>) {
        match outcome {
            NavOutcome::Moved => notices.push(QuizNotice::Moved {
                index: self.session.current_index(),
            }),
            NavOutcome::Unchanged => {}
            NavOutcome::Wrapped => {
                notices.push(QuizNotice::ShortSetFinished);
                notices.push(QuizNotice::Moved { index: 0 });
            }
            NavOutcome::Completed(result) => notices.push(QuizNotice::Completed(result)),
        }
    }

    /// Keep exactly one ticker running for the session's live epoch.
    fn sync_countdown(&mut self) {
        let wanted = self.session.countdown_epoch();
        let running = self.countdown.as_ref().map(CountdownTask::epoch);
        if wanted == running {
            return;
        }
        self.countdown = wanted
            .map(|epoch| CountdownTask::spawn(epoch, TICK_PERIOD, self.events_tx.clone()));
    }
}

fn persistence_notices(
    persistence: Option<Result<PersistenceOutcome, PersistenceError>>,
    notices: &mut Vec<QuizNotice>,
) {
    match persistence {
        Some(Ok(PersistenceOutcome::Saved)) => notices.push(QuizNotice::ResultSaved),
        Some(Ok(PersistenceOutcome::AlreadySaved)) | None => {}
        Some(Err(err)) => notices.push(QuizNotice::PersistenceFailed(err.to_string())),
    }
}

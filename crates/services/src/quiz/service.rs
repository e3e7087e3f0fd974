use std::fmt;

use quiz_core::Clock;
use quiz_core::model::{AnswerSheet, Difficulty, Question, QuestionKind, QuizResult, ScoreCard};

use super::countdown::{Countdown, CountdownTick, TimerEpoch};
use super::input::QuizAction;
use super::progress::QuizProgress;
use crate::settings::QuizSettings;

//
// ─── PHASE & OUTCOMES ──────────────────────────────────────────────────────────
//

/// Coarse lifecycle stage of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    InProgress,
    Completed,
}

/// Where the current question sits in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPosition {
    OnFirst,
    OnMiddle,
    OnLast,
}

/// Effect of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Moved,
    Unchanged,
    /// Short-answer review looped from the last question back to the first.
    Wrapped,
    /// A scored set was finished and graded.
    Completed(QuizResult),
}

/// Effect of a timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Counting(u32),
    /// The countdown hit zero and the session advanced as if `next()` was called.
    Advanced(NavOutcome),
}

/// Effect of a routed input action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    AnswerRecorded { index: usize },
    Navigated(NavOutcome),
    RevealToggled { revealed: bool },
    Ignored,
}

/// Token for one outstanding generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTicket(u64);

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a generated question set.
///
/// Holds the questions, the sparse answer sheet, the navigation cursor and the
/// per-question countdown. All transitions are synchronous; network calls live
/// in `QuizLoopService`.
pub struct QuizSession {
    clock: Clock,
    kind: QuestionKind,
    difficulty: Difficulty,
    topic: String,
    questions: Vec<Question>,
    answers: AnswerSheet,
    current: usize,
    revealed: bool,
    visible: bool,
    phase: QuizPhase,
    countdown: Countdown,
    score_card: Option<ScoreCard>,
    result: Option<QuizResult>,
    result_saved: bool,
    pending: Option<GenerationTicket>,
    tickets_issued: u64,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: &QuizSettings, clock: Clock) -> Self {
        Self {
            clock,
            kind: QuestionKind::default(),
            difficulty: Difficulty::default(),
            topic: String::new(),
            questions: Vec::new(),
            answers: AnswerSheet::new(),
            current: 0,
            revealed: false,
            visible: true,
            phase: QuizPhase::Idle,
            countdown: Countdown::new(settings.timer_secs()),
            score_card: None,
            result: None,
            result_saved: false,
            pending: None,
            tickets_issued: 0,
        }
    }

    // ─── Question Set Holder ─────────────────────────────────────────────────

    /// Replace the question set and start from the first question.
    ///
    /// An empty list leaves the session idle.
    pub fn load(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.answers.clear();
        self.current = 0;
        self.revealed = false;
        self.score_card = None;
        self.result = None;
        self.result_saved = false;

        if self.questions.is_empty() {
            self.phase = QuizPhase::Idle;
            self.countdown.disarm();
        } else {
            self.phase = QuizPhase::InProgress;
            self.restart_countdown();
        }
    }

    /// Record the answer for `index`, replacing any earlier one.
    ///
    /// Returns `false` when the index is outside the set.
    pub fn record_answer(&mut self, index: usize, value: impl Into<String>) -> bool {
        if index >= self.questions.len() {
            return false;
        }
        self.answers.record(index, value);
        true
    }

    /// "Start new quiz": drop everything back to idle.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.topic.clear();
        self.current = 0;
        self.revealed = false;
        self.phase = QuizPhase::Idle;
        self.countdown.disarm();
        self.score_card = None;
        self.result = None;
        self.result_saved = false;
        self.pending = None;
    }

    /// Switch the question kind. Any change discards the current set.
    pub fn set_kind(&mut self, kind: QuestionKind) {
        if kind == self.kind {
            return;
        }
        let topic = std::mem::take(&mut self.topic);
        self.reset();
        self.topic = topic;
        self.kind = kind;
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Visibility gate for the countdown; hidden sessions ignore ticks.
    ///
    /// Showing the session again resumes the countdown under a new epoch, so
    /// ticks sent before it was hidden stay stale.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible && self.phase == QuizPhase::InProgress {
            self.countdown.resume();
        }
        self.visible = visible;
    }

    // ─── Navigation Controller ───────────────────────────────────────────────

    /// Advance to the next question.
    ///
    /// On the last question a scored set is graded and completed, while a
    /// short-answer set wraps back to the first question.
    pub fn next(&mut self) -> NavOutcome {
        if self.phase != QuizPhase::InProgress {
            return NavOutcome::Unchanged;
        }
        self.revealed = false;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.restart_countdown();
            return NavOutcome::Moved;
        }

        if self.kind.is_scored() {
            return NavOutcome::Completed(self.complete());
        }

        self.current = 0;
        self.restart_countdown();
        NavOutcome::Wrapped
    }

    pub fn previous(&mut self) -> NavOutcome {
        if self.phase != QuizPhase::InProgress || self.current == 0 {
            return NavOutcome::Unchanged;
        }
        self.current -= 1;
        self.revealed = false;
        self.restart_countdown();
        NavOutcome::Moved
    }

    /// Flip answer visibility. Only short and true/false sets reveal answers.
    pub fn toggle_reveal(&mut self) -> bool {
        if self.phase == QuizPhase::InProgress && self.kind.supports_reveal() {
            self.revealed = !self.revealed;
        }
        self.revealed
    }

    /// Execute a routed action against the current state.
    pub fn apply(&mut self, action: QuizAction) -> ActionOutcome {
        if self.phase != QuizPhase::InProgress {
            return ActionOutcome::Ignored;
        }
        match action {
            QuizAction::SelectAnswer(value) => {
                let index = self.current;
                if self.record_answer(index, value) {
                    ActionOutcome::AnswerRecorded { index }
                } else {
                    ActionOutcome::Ignored
                }
            }
            QuizAction::Next => ActionOutcome::Navigated(self.next()),
            QuizAction::Previous => ActionOutcome::Navigated(self.previous()),
            QuizAction::ToggleReveal => {
                if !self.kind.supports_reveal() {
                    return ActionOutcome::Ignored;
                }
                ActionOutcome::RevealToggled {
                    revealed: self.toggle_reveal(),
                }
            }
        }
    }

    // ─── Timer ───────────────────────────────────────────────────────────────

    /// Feed one elapsed second from the countdown task for `epoch`.
    pub fn tick(&mut self, epoch: TimerEpoch) -> TickOutcome {
        if self.phase != QuizPhase::InProgress || !self.visible {
            return TickOutcome::Ignored;
        }
        match self.countdown.tick(epoch) {
            CountdownTick::Stale => TickOutcome::Ignored,
            CountdownTick::Running(remaining) => TickOutcome::Counting(remaining),
            CountdownTick::Expired => TickOutcome::Advanced(self.next()),
        }
    }

    /// Epoch the scheduler should be ticking, if any.
    ///
    /// `None` once the session leaves `InProgress`, for untimed kinds, and
    /// while hidden.
    #[must_use]
    pub fn countdown_epoch(&self) -> Option<TimerEpoch> {
        if self.phase != QuizPhase::InProgress || !self.visible {
            return None;
        }
        self.countdown.active_epoch()
    }

    fn restart_countdown(&mut self) {
        if self.kind.is_timed() {
            self.countdown.arm();
        } else {
            self.countdown.disarm();
        }
    }

    // ─── Scoring & Completion ────────────────────────────────────────────────

    fn complete(&mut self) -> QuizResult {
        let card = ScoreCard::grade(&self.questions, &self.answers);
        let result = QuizResult::from_score_card(
            self.topic.clone(),
            self.kind,
            self.difficulty,
            &card,
            self.clock.now(),
        );
        tracing::debug!(
            score = result.score,
            total = result.total_questions,
            "quiz completed"
        );
        self.score_card = Some(card);
        self.result = Some(result.clone());
        self.phase = QuizPhase::Completed;
        self.countdown.disarm();
        result
    }

    // ─── Generation bookkeeping ──────────────────────────────────────────────

    pub(crate) fn issue_ticket(&mut self) -> GenerationTicket {
        self.tickets_issued += 1;
        let ticket = GenerationTicket(self.tickets_issued);
        self.pending = Some(ticket);
        ticket
    }

    /// Clears the pending ticket if it matches; `false` means the response is stale.
    pub(crate) fn redeem_ticket(&mut self, ticket: GenerationTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_result_saved(&mut self) {
        self.result_saved = true;
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == QuizPhase::InProgress {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&str> {
        self.answers.get(self.current)
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn timer_secs(&self) -> u32 {
        self.countdown.initial()
    }

    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score_card.as_ref().map(ScoreCard::score)
    }

    #[must_use]
    pub fn score_card(&self) -> Option<&ScoreCard> {
        self.score_card.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_result_saved(&self) -> bool {
        self.result_saved
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn position(&self) -> Option<NavPosition> {
        if self.phase != QuizPhase::InProgress {
            return None;
        }
        let last = self.questions.len().saturating_sub(1);
        Some(match self.current {
            0 => NavPosition::OnFirst,
            i if i >= last => NavPosition::OnLast,
            _ => NavPosition::OnMiddle,
        })
    }

    /// Label for the forward button.
    #[must_use]
    pub fn advance_label(&self) -> &'static str {
        let on_last = self.phase == QuizPhase::InProgress
            && self.current + 1 >= self.questions.len();
        if on_last && self.kind.is_scored() {
            "Finish Quiz"
        } else {
            "Next"
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress::from_session(self)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("current", &self.current)
            .field("remaining_secs", &self.countdown.remaining())
            .field("score", &self.score())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{OptionLabel, QuestionId, QuizOption};
    use quiz_core::time::fixed_clock;

    fn mcq(answer: &str) -> Question {
        let options = OptionLabel::ALL
            .iter()
            .map(|label| QuizOption::new(*label, format!("choice {label}")))
            .collect();
        Question::multiple_choice(QuestionId::generate(), "Pick", options, answer).unwrap()
    }

    fn tf(answer: &str) -> Question {
        Question::true_false(QuestionId::generate(), "Is it?", answer).unwrap()
    }

    fn short() -> Question {
        Question::short(QuestionId::generate(), "Define entropy", "Disorder").unwrap()
    }

    fn session(kind: QuestionKind, questions: Vec<Question>) -> QuizSession {
        let mut session = QuizSession::new(&QuizSettings::default(), fixed_clock());
        session.set_kind(kind);
        session.set_topic("Physics");
        session.load(questions);
        session
    }

    #[test]
    fn load_starts_in_progress_at_first_question() {
        let s = session(QuestionKind::MultipleChoice, vec![mcq("A"), mcq("B")]);
        assert_eq!(s.phase(), QuizPhase::InProgress);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.remaining_secs(), 30);
        assert!(s.countdown_epoch().is_some());
        assert_eq!(s.position(), Some(NavPosition::OnFirst));
    }

    #[test]
    fn empty_load_stays_idle() {
        let s = session(QuestionKind::MultipleChoice, Vec::new());
        assert_eq!(s.phase(), QuizPhase::Idle);
        assert_eq!(s.countdown_epoch(), None);
        assert_eq!(s.current_question(), None);
    }

    #[test]
    fn record_answer_overwrites() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A")]);
        assert!(s.record_answer(0, "A"));
        assert!(s.record_answer(0, "B"));
        assert_eq!(s.answers().get(0), Some("B"));
        assert!(!s.record_answer(5, "C"));
    }

    #[test]
    fn navigation_resets_timer_and_reveal() {
        let mut s = session(QuestionKind::TrueFalse, vec![tf("true"), tf("false"), tf("true")]);
        let epoch = s.countdown_epoch().unwrap();
        s.tick(epoch);
        s.toggle_reveal();
        assert_eq!(s.remaining_secs(), 29);

        assert_eq!(s.next(), NavOutcome::Moved);
        assert_eq!(s.remaining_secs(), 30);
        assert!(!s.is_revealed());
        assert_eq!(s.position(), Some(NavPosition::OnMiddle));

        s.tick(s.countdown_epoch().unwrap());
        assert_eq!(s.previous(), NavOutcome::Moved);
        assert_eq!(s.remaining_secs(), 30);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn previous_on_first_is_noop() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A"), mcq("B")]);
        let epoch = s.countdown_epoch();
        assert_eq!(s.previous(), NavOutcome::Unchanged);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.countdown_epoch(), epoch);
    }

    #[test]
    fn stale_tick_does_not_touch_new_question() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A"), mcq("B")]);
        let old = s.countdown_epoch().unwrap();
        s.next();
        assert_eq!(s.tick(old), TickOutcome::Ignored);
        assert_eq!(s.remaining_secs(), 30);
    }

    #[test]
    fn short_mode_wraps_and_never_completes() {
        let mut s = session(QuestionKind::Short, vec![short(), short()]);
        assert_eq!(s.next(), NavOutcome::Moved);
        assert_eq!(s.next(), NavOutcome::Wrapped);
        assert_eq!(s.current_index(), 0);
        for _ in 0..5 {
            s.next();
        }
        assert_eq!(s.phase(), QuizPhase::InProgress);
        assert_eq!(s.score(), None);
        assert_eq!(s.countdown_epoch(), None);
        assert_eq!(s.remaining_secs(), 30);
    }

    #[test]
    fn reveal_is_noop_for_multiple_choice() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A")]);
        assert!(!s.toggle_reveal());
        assert_eq!(s.apply(QuizAction::ToggleReveal), ActionOutcome::Ignored);

        let mut s = session(QuestionKind::Short, vec![short()]);
        assert!(s.toggle_reveal());
        assert!(!s.toggle_reveal());
    }

    #[test]
    fn finishing_scored_set_completes_and_stops_timer() {
        let mut s = session(QuestionKind::TrueFalse, vec![tf("true"), tf("false")]);
        s.record_answer(0, "TRUE");
        s.next();
        s.record_answer(1, "true");
        assert_eq!(s.advance_label(), "Finish Quiz");
        let epoch = s.countdown_epoch().unwrap();

        let NavOutcome::Completed(result) = s.next() else {
            panic!("expected completion");
        };
        assert_eq!(result.score, 1);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.percentage, 50);
        assert_eq!(result.topic, "Physics");
        assert_eq!(s.phase(), QuizPhase::Completed);
        assert_eq!(s.score(), Some(1));
        assert_eq!(s.countdown_epoch(), None);

        let before = s.remaining_secs();
        for _ in 0..40 {
            assert_eq!(s.tick(epoch), TickOutcome::Ignored);
        }
        assert_eq!(s.remaining_secs(), before);
        assert_eq!(s.next(), NavOutcome::Unchanged);
    }

    #[test]
    fn expiry_advances_exactly_once_without_answer() {
        let settings = QuizSettings::default().with_timer_secs(2);
        let mut s = QuizSession::new(&settings, fixed_clock());
        s.set_kind(QuestionKind::TrueFalse);
        s.load(vec![tf("true"), tf("false"), tf("true")]);

        let epoch = s.countdown_epoch().unwrap();
        assert_eq!(s.tick(epoch), TickOutcome::Counting(1));
        assert_eq!(s.tick(epoch), TickOutcome::Advanced(NavOutcome::Moved));
        assert_eq!(s.tick(epoch), TickOutcome::Ignored);
        assert_eq!(s.current_index(), 1);
        assert!(!s.answers().contains(0));
    }

    #[test]
    fn hidden_session_ignores_ticks() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A")]);
        let epoch = s.countdown_epoch().unwrap();
        s.set_visible(false);
        assert_eq!(s.countdown_epoch(), None);
        assert_eq!(s.tick(epoch), TickOutcome::Ignored);
        s.set_visible(true);
        let resumed = s.countdown_epoch().unwrap();
        assert_ne!(resumed, epoch);
        assert_eq!(s.tick(epoch), TickOutcome::Ignored);
        assert_eq!(s.remaining_secs(), 30);
        assert_eq!(s.tick(resumed), TickOutcome::Counting(29));
    }

    #[test]
    fn showing_twice_keeps_the_same_epoch() {
        let mut s = session(QuestionKind::TrueFalse, vec![tf("true")]);
        s.set_visible(true);
        let epoch = s.countdown_epoch().unwrap();
        s.set_visible(true);
        assert_eq!(s.countdown_epoch(), Some(epoch));
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A")]);
        s.record_answer(0, "A");
        s.next();
        assert_eq!(s.score(), Some(1));

        s.reset();
        assert_eq!(s.phase(), QuizPhase::Idle);
        assert!(s.questions().is_empty());
        assert!(s.answers().is_empty());
        assert_eq!(s.score(), None);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.topic(), "");
    }

    #[test]
    fn changing_kind_discards_the_set() {
        let mut s = session(QuestionKind::MultipleChoice, vec![mcq("A")]);
        s.record_answer(0, "A");
        s.set_kind(QuestionKind::Short);
        assert_eq!(s.phase(), QuizPhase::Idle);
        assert!(s.questions().is_empty());
        assert!(s.answers().is_empty());
        assert_eq!(s.topic(), "Physics");
    }

    #[test]
    fn stale_ticket_is_not_redeemed() {
        let mut s = session(QuestionKind::MultipleChoice, Vec::new());
        let first = s.issue_ticket();
        s.reset();
        assert!(!s.redeem_ticket(first));
        let second = s.issue_ticket();
        assert!(s.redeem_ticket(second));
        assert!(!s.is_generating());
    }
}

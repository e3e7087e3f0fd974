use quiz_core::model::{OptionLabel, QuestionKind};

use super::service::{QuizPhase, QuizSession};

/// Keys the quiz reacts to. Everything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Raw keyboard or pointer input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    ClickOption(OptionLabel),
    ClickTrueFalse(bool),
    ClickReveal,
    ClickNext,
    ClickPrevious,
}

/// What an input means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    SelectAnswer(String),
    Next,
    Previous,
    ToggleReveal,
}

/// Maps input to actions, gated by phase and question kind.
///
/// Routing reads the session as it is when the event is handled, so a burst
/// of key presses resolves one at a time against fresh state.
pub struct InputRouter;

impl InputRouter {
    /// Returns `None` for input the current state does not accept.
    #[must_use]
    pub fn route(session: &QuizSession, event: InputEvent) -> Option<QuizAction> {
        if session.phase() != QuizPhase::InProgress {
            return None;
        }

        match event {
            InputEvent::Key(Key::Enter | Key::ArrowRight) | InputEvent::ClickNext => {
                Some(QuizAction::Next)
            }
            InputEvent::Key(Key::ArrowLeft) | InputEvent::ClickPrevious => {
                Some(QuizAction::Previous)
            }
            InputEvent::ClickReveal => session
                .kind()
                .supports_reveal()
                .then_some(QuizAction::ToggleReveal),
            InputEvent::Key(Key::Char(c)) => Self::route_char(session, c),
            InputEvent::ClickOption(label) => Self::select_option(session, label),
            InputEvent::ClickTrueFalse(value) => {
                (session.kind() == QuestionKind::TrueFalse).then(|| select_bool(value))
            }
            InputEvent::Key(Key::Other) => None,
        }
    }

    fn route_char(session: &QuizSession, c: char) -> Option<QuizAction> {
        match session.kind() {
            QuestionKind::MultipleChoice => {
                let label = OptionLabel::from_letter(c).or_else(|| OptionLabel::from_digit(c))?;
                Self::select_option(session, label)
            }
            QuestionKind::TrueFalse => match c.to_ascii_uppercase() {
                'T' | '1' => Some(select_bool(true)),
                'F' | '2' => Some(select_bool(false)),
                _ => None,
            },
            QuestionKind::Short => None,
        }
    }

    fn select_option(session: &QuizSession, label: OptionLabel) -> Option<QuizAction> {
        if session.kind() != QuestionKind::MultipleChoice {
            return None;
        }
        session
            .current_question()
            .filter(|question| question.has_option(label))
            .map(|_| QuizAction::SelectAnswer(label.as_str().to_string()))
    }
}

fn select_bool(value: bool) -> QuizAction {
    QuizAction::SelectAnswer(value.to_string())
}

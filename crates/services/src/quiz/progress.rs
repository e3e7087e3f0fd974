use super::service::{QuizPhase, QuizSession};

/// Snapshot of where the learner is, for headers and progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// 1-based position of the current question; 0 when nothing is loaded.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// Seconds left on the current question, for timed kinds in progress.
    pub remaining_secs: Option<u32>,
    /// Share of the set reached so far, 0..=100.
    pub percent: u8,
}

impl QuizProgress {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let total = session.questions().len();
        let position = match session.phase() {
            QuizPhase::Idle => 0,
            QuizPhase::InProgress => session.current_index() + 1,
            QuizPhase::Completed => total,
        };
        let timed = session.phase() == QuizPhase::InProgress && session.kind().is_timed();
        let percent = if total == 0 {
            0
        } else {
            u8::try_from(position * 100 / total).unwrap_or(100)
        };

        Self {
            position,
            total,
            answered: session.answers().len(),
            remaining_secs: timed.then(|| session.remaining_secs()),
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QuizSettings;
    use quiz_core::model::{Question, QuestionId, QuestionKind};
    use quiz_core::time::fixed_clock;

    fn tf() -> Question {
        Question::true_false(QuestionId::generate(), "Q", "true").unwrap()
    }

    #[test]
    fn idle_session_reports_nothing() {
        let s = QuizSession::new(&QuizSettings::default(), fixed_clock());
        let p = s.progress();
        assert_eq!(p.position, 0);
        assert_eq!(p.total, 0);
        assert_eq!(p.percent, 0);
        assert_eq!(p.remaining_secs, None);
    }

    #[test]
    fn tracks_position_answers_and_timer() {
        let mut s = QuizSession::new(&QuizSettings::default(), fixed_clock());
        s.set_kind(QuestionKind::TrueFalse);
        s.load(vec![tf(), tf(), tf(), tf()]);
        s.record_answer(0, "true");
        s.next();

        let p = s.progress();
        assert_eq!(p.position, 2);
        assert_eq!(p.total, 4);
        assert_eq!(p.answered, 1);
        assert_eq!(p.percent, 50);
        assert_eq!(p.remaining_secs, Some(30));
    }

    #[test]
    fn short_sets_have_no_timer() {
        let mut s = QuizSession::new(&QuizSettings::default(), fixed_clock());
        s.set_kind(QuestionKind::Short);
        s.load(vec![Question::short(QuestionId::generate(), "Q", "A").unwrap()]);
        assert_eq!(s.progress().remaining_secs, None);
        assert_eq!(s.progress().percent, 100);
    }
}

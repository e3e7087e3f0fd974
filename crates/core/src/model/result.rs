use chrono::{DateTime, Utc};

use crate::model::answer::AnswerSheet;
use crate::model::kind::{Difficulty, QuestionKind};
use crate::model::question::Question;

/// Correctness of one question after grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub index: usize,
    pub given: Option<String>,
    pub expected: String,
    pub is_correct: bool,
}

/// Per-question grading of a finished question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    outcomes: Vec<QuestionOutcome>,
    score: u32,
}

impl ScoreCard {
    /// Grades every question against the answer sheet.
    ///
    /// An index counts as correct only when an answer is present and matches
    /// the canonical answer ignoring case.
    #[must_use]
    pub fn grade(questions: &[Question], answers: &AnswerSheet) -> Self {
        let outcomes: Vec<QuestionOutcome> = questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let given = answers.get(index);
                QuestionOutcome {
                    index,
                    given: given.map(str::to_string),
                    expected: question.correct_answer().to_string(),
                    is_correct: given.is_some_and(|value| question.accepts(value)),
                }
            })
            .collect();
        let correct = outcomes.iter().filter(|o| o.is_correct).count();

        Self {
            score: u32::try_from(correct).unwrap_or(u32::MAX),
            outcomes,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.outcomes.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total())
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }
}

/// `round(score / total * 100)` with halves rounded up. Zero total yields 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    let rounded = (score * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(100)
}

/// Outcome of a completed, scored quiz as handed to result persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn from_score_card(
        topic: impl Into<String>,
        kind: QuestionKind,
        difficulty: Difficulty,
        card: &ScoreCard,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            score: card.score(),
            total_questions: card.total(),
            percentage: card.percentage(),
            kind,
            difficulty,
            completed_at,
        }
    }

    /// More than half the questions answered correctly.
    #[must_use]
    pub fn passed(&self) -> bool {
        u64::from(self.score) * 2 > u64::from(self.total_questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionLabel, QuestionId, QuizOption};
    use crate::time::fixed_now;

    fn mcq(id: &str, answer: &str) -> Question {
        let options = OptionLabel::ALL
            .iter()
            .map(|label| QuizOption::new(*label, format!("option {label}")))
            .collect();
        Question::multiple_choice(QuestionId::new(id).unwrap(), "Pick one", options, answer).unwrap()
    }

    fn tf(id: &str, answer: &str) -> Question {
        Question::true_false(QuestionId::new(id).unwrap(), "True?", answer).unwrap()
    }

    #[test]
    fn mixed_answers_score_one() {
        let questions = vec![mcq("1", "A"), tf("2", "true")];
        let mut answers = AnswerSheet::new();
        answers.record(0, "A");
        answers.record(1, "false");

        let card = ScoreCard::grade(&questions, &answers);
        assert_eq!(card.score(), 1);
        assert!(card.outcomes()[0].is_correct);
        assert!(!card.outcomes()[1].is_correct);
    }

    #[test]
    fn matching_ignores_case() {
        let questions = vec![tf("1", "true")];
        let mut answers = AnswerSheet::new();
        answers.record(0, "TRUE");
        assert_eq!(ScoreCard::grade(&questions, &answers).score(), 1);
    }

    #[test]
    fn unanswered_question_is_incorrect() {
        let questions = vec![mcq("1", "B")];
        let card = ScoreCard::grade(&questions, &AnswerSheet::new());
        assert_eq!(card.score(), 0);
        assert_eq!(card.outcomes()[0].given, None);
        assert_eq!(card.outcomes()[0].expected, "B");
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn result_passes_above_half() {
        let questions = vec![mcq("1", "A"), mcq("2", "B"), mcq("3", "C"), mcq("4", "D")];
        let mut answers = AnswerSheet::new();
        answers.record(0, "A");
        answers.record(1, "B");
        let card = ScoreCard::grade(&questions, &answers);
        let result = QuizResult::from_score_card(
            "Planets",
            QuestionKind::MultipleChoice,
            Difficulty::Easy,
            &card,
            fixed_now(),
        );
        assert_eq!(result.percentage, 50);
        assert!(!result.passed());

        answers.record(2, "c");
        let card = ScoreCard::grade(&questions, &answers);
        let result = QuizResult::from_score_card(
            "Planets",
            QuestionKind::MultipleChoice,
            Difficulty::Easy,
            &card,
            fixed_now(),
        );
        assert!(result.passed());
    }
}

mod answer;
mod ids;
mod kind;
mod question;
mod result;

pub use answer::AnswerSheet;
pub use ids::{ParseIdError, QuestionId};
pub use kind::{Difficulty, ParseKindError, QuestionKind};
pub use question::{OptionLabel, OptionLabelError, Question, QuestionError, QuizOption};
pub use result::{QuestionOutcome, QuizResult, ScoreCard, percentage};

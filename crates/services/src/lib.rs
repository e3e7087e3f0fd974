#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;
pub mod settings;

pub use quiz_core::Clock;

pub use error::{GenerationError, PersistenceError};
pub use settings::QuizSettings;

pub use quiz::{
    ActionOutcome, AdvanceResult, GenerationForm, GenerationOutcome, GenerationTicket, InputEvent,
    InputRouter, Key, NavOutcome, NavPosition, PersistenceOutcome, QuizAction, QuizEvent,
    QuizLoopService, QuizNotice, QuizPhase, QuizProgress, QuizRunner, QuizSession, TickOutcome,
    TimerEpoch,
};

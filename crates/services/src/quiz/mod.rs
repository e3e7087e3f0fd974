//! Quiz session engine: state machine, input routing, countdown and the
//! event loop that ties them to the generation and results APIs.

mod countdown;
mod input;
mod progress;
mod runner;
mod service;
mod task;
mod workflow;

pub use countdown::TimerEpoch;
pub use input::{InputEvent, InputRouter, Key, QuizAction};
pub use progress::QuizProgress;
pub use runner::{QuizEvent, QuizNotice, QuizRunner};
pub use service::{
    ActionOutcome, GenerationTicket, NavOutcome, NavPosition, QuizPhase, QuizSession, TickOutcome,
};
pub use workflow::{
    AdvanceResult, GenerationForm, GenerationOutcome, PersistenceOutcome, QuizLoopService,
};

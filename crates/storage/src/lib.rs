#![forbid(unsafe_code)]

pub mod http;
pub mod repository;
pub mod user;

pub use repository::{
    ApiError, GenerationRequest, InMemoryQuizApi, QuestionGenerator, QuizApi, ResultRecorder,
};
pub use user::{AuthHeader, UserContext};

use thiserror::Error;

use crate::model::{OptionLabelError, ParseKindError, QuestionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    OptionLabel(#[from] OptionLabelError),
    #[error(transparent)]
    Kind(#[from] ParseKindError),
}

use axum::http::StatusCode;
use thiserror::Error;

use crate::models::Level;

/// Input and state errors raised by the quiz controller. None of them mutate the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("please enter an answer")]
    EmptyAnswer,
    #[error("please select an answer")]
    NoSelectionMade,
    #[error("option {0} does not exist for this question")]
    InvalidOption(usize),
    #[error("a {expected} question cannot take this kind of answer")]
    AnswerTypeMismatch { expected: &'static str },
    #[error("no hints left for this question")]
    HintsExhausted,
    #[error("{0} is locked until the previous level scores at least 12/15")]
    LevelLocked(Level),
    #[error("this question has already been answered")]
    AlreadyAnswered,
    #[error("answer or skip the current question first")]
    QuestionNotAnswered,
    #[error("{0} questions left before the quiz can finish")]
    QuestionsRemaining(usize),
    #[error("the quiz is already finished")]
    SessionFinished,
    #[error("no quiz in progress")]
    NoActiveSession,
}

impl QuizError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuizError::EmptyAnswer
            | QuizError::NoSelectionMade
            | QuizError::InvalidOption(_)
            | QuizError::AnswerTypeMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            QuizError::LevelLocked(_) => StatusCode::FORBIDDEN,
            QuizError::NoActiveSession => StatusCode::NOT_FOUND,
            QuizError::HintsExhausted
            | QuizError::AlreadyAnswered
            | QuizError::QuestionNotAnswered
            | QuizError::QuestionsRemaining(_)
            | QuizError::SessionFinished => StatusCode::CONFLICT,
        }
    }
}

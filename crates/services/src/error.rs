//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use tutor_core::model::{QuestionError, QuizResultError, TopicKeyError};

/// Errors emitted by `ProgressTracker`.
///
/// Failed saves during ordinary mutations are logged and reported on the
/// returned value instead; only `flush` surfaces `Storage`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error(transparent)]
    InvalidTopic(#[from] TopicKeyError),
    #[error(transparent)]
    InvalidQuiz(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("invalid quiz input: {0}")]
    InvalidInput(String),
    #[error("no active quiz session")]
    NoActiveSession,
    #[error("no answers recorded yet")]
    NoResults,
    #[error("no attempted topics to review")]
    NoWeakAreas,
    #[error("question {index} is malformed: {source}")]
    MalformedQuestionData {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

#![forbid(unsafe_code)]

pub mod error;
pub mod progress;
pub mod quiz;

pub use tutor_core::Clock;

pub use error::{QuizError, TrackerError};
pub use progress::{
    AreaSummary, DEFAULT_AREA_LIMIT, MasteryUpdate, OverallStats, ProgressSummary, ProgressTracker, QuizRecord,
    SharedTracker, SubjectMastery, TopicMastery,
};
pub use quiz::{
    AnswerFeedback, CurrentQuestion, QuizEngine, QuizProgress, QuizReport, QuizSession, QuizState,
    format_duration, parse_questions,
};

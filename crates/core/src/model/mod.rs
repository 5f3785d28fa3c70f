mod achievement;
mod ids;
mod mastery;
mod progress;
mod quiz;

pub use achievement::{Achievement, AchievementId};
pub use ids::{TopicKey, TopicKeyError};
pub use mastery::{MasteryLevel, SubjectRecord, TopicRecord};
pub use progress::{ProgressState, QUIZ_HISTORY_LIMIT, QuizResult, QuizResultError};
pub use quiz::{
    AnswerRecord, Difficulty, DifficultyParseError, LetterGrade, OPTION_COUNT, OptionLetter, Question,
    QuestionDraft, QuestionError,
};

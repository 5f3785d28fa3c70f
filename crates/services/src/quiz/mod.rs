mod engine;
mod parse;
mod report;
mod session;

pub use engine::{AnswerFeedback, CurrentQuestion, QuizEngine, QuizProgress, QuizState};
pub use parse::parse_questions;
pub use report::{QuizReport, format_duration};
pub use session::QuizSession;

use chrono::Duration;

use tutor_core::model::{AnswerRecord, Difficulty, LetterGrade, QuizResult};

/// Everything shown to the learner when a quiz ends.
///
/// `score`, `percentage` and `grade` cover only the answered questions, so
/// one correct answer out of five questions asked grades as 100%.
/// `question_count` keeps the full quiz length for display.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Number of correct answers.
    pub score: u32,
    /// Number of answers submitted.
    pub total: u32,
    /// Number of questions in the quiz, answered or not.
    pub question_count: u32,
    /// `score` out of `total`, not out of `question_count`.
    pub percentage: f64,
    pub grade: LetterGrade,
    pub message: &'static str,
    pub elapsed: Duration,
    /// `elapsed` as `m:ss`.
    pub duration: String,
    pub answers: Vec<AnswerRecord>,
    /// The entry appended to the quiz history.
    pub result: QuizResult,
    /// False if the history entry could not be saved.
    pub persisted: bool,
}

impl QuizReport {
    /// Answers that were graded incorrect, in question order.
    #[must_use]
    pub fn missed(&self) -> Vec<&AnswerRecord> {
        self.answers.iter().filter(|a| !a.is_correct).collect()
    }
}

/// Format as `minutes:seconds` with zero-padded seconds.
///
/// Negative durations format as `0:00`.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}:{:02}", total / 60, total % 60)
}

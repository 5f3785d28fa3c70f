use chrono::{DateTime, Utc};
use std::fmt;

use tutor_core::model::{AnswerRecord, Difficulty, Question, TopicKey};

use crate::error::QuizError;

/// One run through a fixed list of questions on a single topic.
///
/// Steps through the questions in order, recording each answer. The session
/// is complete once every question has an answer.
#[derive(Clone)]
pub struct QuizSession {
    key: TopicKey,
    difficulty: Difficulty,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Create a session positioned on the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidInput` if `questions` is empty.
    pub fn new(
        key: TopicKey,
        difficulty: Difficulty,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::InvalidInput(
                "a quiz needs at least one question".into(),
            ));
        }

        Ok(Self {
            key,
            difficulty,
            questions,
            current: 0,
            answers: Vec::new(),
            started_at,
        })
    }

    #[must_use]
    pub fn key(&self) -> &TopicKey {
        &self.key
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        self.key.subject()
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        self.key.topic()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.current)
    }

    /// Index of the question awaiting an answer.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Grade `answer` against the current question and advance.
    ///
    /// An answer that is not a valid option letter counts as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if every question is answered.
    pub fn answer_current(
        &mut self,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<&AnswerRecord, QuizError> {
        let Some(question) = self.questions.get(self.current) else {
            return Err(QuizError::NoActiveSession);
        };

        self.answers.push(AnswerRecord {
            question_index: self.current,
            answer: answer.trim().to_owned(),
            correct_answer: question.correct_option(),
            is_correct: question.is_correct(answer),
            answered_at,
        });
        self.current += 1;

        self.answers.last().ok_or(QuizError::NoActiveSession)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("key", &self.key)
            .field("difficulty", &self.difficulty)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

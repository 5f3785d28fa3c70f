use std::fmt;

use tutor_core::model::{
    Difficulty, LetterGrade, OptionLetter, Question, QuestionDraft, TopicKey,
};

use super::parse::validate_drafts;
use super::report::{QuizReport, format_duration};
use super::session::QuizSession;
use crate::Clock;
use crate::error::QuizError;
use crate::progress::{MasteryUpdate, ProgressTracker};

/// Lifecycle of the engine's quiz slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// No quiz started, or the last one was consumed by `results`/`reset`.
    Empty,
    /// Questions remain unanswered.
    Active,
    /// Every question answered; results not yet taken.
    Complete,
}

/// The question awaiting an answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentQuestion<'a> {
    pub question: &'a Question,
    /// 0-based position in the quiz.
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Returned for each submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer: OptionLetter,
    pub explanation: String,
    pub has_next: bool,
    /// The mastery change applied to the quiz topic.
    pub mastery: MasteryUpdate,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives at most one quiz at a time and reports answers to a tracker.
///
/// Starting a new quiz discards any unfinished one. Mastery updates already
/// applied for its answers stay in place.
#[derive(Default)]
pub struct QuizEngine {
    clock: Clock,
    session: Option<QuizSession>,
}

impl QuizEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        match &self.session {
            None => QuizState::Empty,
            Some(session) if session.is_complete() => QuizState::Complete,
            Some(_) => QuizState::Active,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// Begin a quiz on `(subject, topic)` with already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidInput` if `questions` is empty or the
    /// subject/topic is blank.
    pub fn start(
        &mut self,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<(), QuizError> {
        let key = TopicKey::new(subject, topic)
            .map_err(|e| QuizError::InvalidInput(e.to_string()))?;
        self.begin(key, difficulty, questions)
    }

    /// Validate raw drafts and begin a quiz with them.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MalformedQuestionData` for the first invalid draft,
    /// otherwise the same errors as [`QuizEngine::start`].
    pub fn start_from_drafts(
        &mut self,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        drafts: Vec<QuestionDraft>,
    ) -> Result<(), QuizError> {
        let questions = validate_drafts(drafts)?;
        self.start(subject, topic, difficulty, questions)
    }

    /// Begin a quiz on the learner's weakest attempted topic.
    ///
    /// Returns the topic the quiz targets.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoWeakAreas` if no topic has been attempted, or
    /// `QuizError::InvalidInput` if `questions` is empty.
    pub fn start_review(
        &mut self,
        tracker: &ProgressTracker,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<TopicKey, QuizError> {
        let weakest = tracker
            .weak_areas(1)
            .into_iter()
            .next()
            .ok_or(QuizError::NoWeakAreas)?;
        let key = TopicKey::new(&weakest.subject, &weakest.topic)
            .map_err(|e| QuizError::InvalidInput(e.to_string()))?;

        self.begin(key.clone(), difficulty, questions)?;
        Ok(key)
    }

    fn begin(
        &mut self,
        key: TopicKey,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<(), QuizError> {
        let session = QuizSession::new(key, difficulty, questions, self.clock.now())?;

        if let Some(previous) = self.session.as_ref().filter(|s| !s.is_complete()) {
            tracing::debug!(
                topic = %previous.key(),
                answered = previous.answered_count(),
                "discarding unfinished quiz"
            );
        }
        tracing::info!(
            topic = %session.key(),
            difficulty = %difficulty,
            questions = session.total_questions(),
            "quiz started"
        );

        self.session = Some(session);
        Ok(())
    }

    /// `None` when no quiz is running or every question is answered.
    #[must_use]
    pub fn current_question(&self) -> Option<CurrentQuestion<'_>> {
        let session = self.session.as_ref()?;
        session.current_question().map(|question| CurrentQuestion {
            question,
            index: session.current_index(),
            total: session.total_questions(),
        })
    }

    #[must_use]
    pub fn progress(&self) -> Option<QuizProgress> {
        self.session.as_ref().map(|s| QuizProgress {
            total: s.total_questions(),
            answered: s.answered_count(),
            remaining: s.remaining(),
            is_complete: s.is_complete(),
        })
    }

    /// Grade `answer` for the current question and update the topic's mastery.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if no quiz is running or all of
    /// its questions are answered.
    pub async fn submit_answer(
        &mut self,
        tracker: &mut ProgressTracker,
        answer: &str,
    ) -> Result<AnswerFeedback, QuizError> {
        let now = self.clock.now();
        let session = self
            .session
            .as_mut()
            .filter(|s| !s.is_complete())
            .ok_or(QuizError::NoActiveSession)?;

        let question_index = session.current_index();
        let record = session.answer_current(answer, now)?.clone();
        let explanation = session
            .questions()
            .get(question_index)
            .map(|q| q.explanation().to_owned())
            .unwrap_or_default();
        let has_next = !session.is_complete();

        let mastery = tracker
            .update_mastery(session.subject(), session.topic(), record.is_correct)
            .await?;

        Ok(AnswerFeedback {
            is_correct: record.is_correct,
            correct_answer: record.correct_answer,
            explanation,
            has_next,
            mastery,
        })
    }

    /// Score the quiz, append it to the tracker's history and close it.
    ///
    /// Unanswered questions are left out of the score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoResults` if no quiz is running or nothing has been
    /// answered yet.
    pub async fn results(&mut self, tracker: &mut ProgressTracker) -> Result<QuizReport, QuizError> {
        let session = self
            .session
            .as_ref()
            .filter(|s| s.answered_count() > 0)
            .ok_or(QuizError::NoResults)?;

        let score = count_u32(session.correct_count());
        let total = count_u32(session.answered_count());
        let question_count = count_u32(session.total_questions());

        let record = tracker
            .record_quiz(session.subject(), question_count, score, total)
            .await?;
        let elapsed = self.clock.elapsed_since(session.started_at());
        let percentage = record.result.percentage;
        let grade = LetterGrade::from_percentage(percentage);

        tracing::info!(
            topic = %session.key(),
            score,
            total,
            grade = %grade,
            "quiz finished"
        );

        let report = QuizReport {
            subject: session.subject().to_owned(),
            topic: session.topic().to_owned(),
            difficulty: session.difficulty(),
            score,
            total,
            question_count,
            percentage,
            grade,
            message: grade.message(),
            elapsed,
            duration: format_duration(elapsed),
            answers: session.answers().to_vec(),
            result: record.result,
            persisted: record.persisted,
        };

        self.session = None;
        Ok(report)
    }

    /// Drop the current quiz. Returns whether one was running.
    pub fn reset(&mut self) -> bool {
        self.session.take().is_some()
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("clock", &self.clock)
            .field("state", &self.state())
            .field("session", &self.session)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

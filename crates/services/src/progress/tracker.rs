use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use storage::repository::ProgressRepository;
use tutor_core::{
    bkt::BktEstimator,
    model::{
        Achievement, MasteryLevel, ProgressState, QuizResult, SubjectRecord, TopicKey,
        TopicRecord,
    },
};

use super::view::{
    AreaSummary, MasteryUpdate, OverallStats, ProgressSummary, QuizRecord, SubjectMastery,
    TopicMastery,
};
use crate::Clock;
use crate::error::TrackerError;

/// Default `n` for weak/strong area listings.
pub const DEFAULT_AREA_LIMIT: usize = 5;

const SUMMARY_AREA_COUNT: usize = 3;
const SUMMARY_RECENT_QUIZZES: usize = 5;

/// Tracker shared between tasks; the lock covers the whole progress state.
pub type SharedTracker = Arc<Mutex<ProgressTracker>>;

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Owns one learner's `ProgressState` and keeps it persisted.
///
/// The state is loaded once on construction and saved after every mutation.
/// A failed save is logged and reported on the returned value; the in-memory
/// state stays authoritative.
pub struct ProgressTracker {
    clock: Clock,
    estimator: BktEstimator,
    repo: Arc<dyn ProgressRepository>,
    storage_key: String,
    state: ProgressState,
}

impl ProgressTracker {
    /// Load the state stored under `storage_key`.
    ///
    /// Falls back to an empty state when nothing is stored or the load fails.
    pub async fn load(repo: Arc<dyn ProgressRepository>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let state = match repo.load(&storage_key).await {
            Ok(Some(state)) => state,
            Ok(None) => ProgressState::default(),
            Err(err) => {
                tracing::warn!(error = %err, key = %storage_key, "failed to load progress, starting fresh");
                ProgressState::default()
            }
        };

        Self {
            clock: Clock::default(),
            estimator: BktEstimator::new(),
            repo,
            storage_key,
            state,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: BktEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Wrap the tracker for use from several tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedTracker {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub fn topic_records(&self) -> &[TopicRecord] {
        self.state.topics()
    }

    #[must_use]
    pub fn subject_records(&self) -> &[SubjectRecord] {
        self.state.subjects()
    }

    #[must_use]
    pub fn quiz_history(&self) -> &[QuizResult] {
        self.state.quiz_history()
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        self.state.achievements()
    }

    /// The `n` most recent quizzes, newest first.
    #[must_use]
    pub fn recent_quizzes(&self, n: usize) -> Vec<QuizResult> {
        self.state.quiz_history().iter().rev().take(n).cloned().collect()
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Fold one graded attempt into `(subject, topic)`.
    ///
    /// Creates the topic at the initial prior if unseen, updates the subject
    /// mean and global totals, awards any achievement whose rule now holds and
    /// saves the state.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidTopic` if subject or topic is blank.
    pub async fn update_mastery(
        &mut self,
        subject: &str,
        topic: &str,
        was_correct: bool,
    ) -> Result<MasteryUpdate, TrackerError> {
        let key = TopicKey::new(subject, topic)?;
        let now = self.clock.now();
        let initial = self.estimator.initial_mastery();

        let record = self.state.topic_entry(&key, initial);
        let previous_mastery = record.mastery();
        let new_mastery = self.estimator.update(previous_mastery, was_correct);
        record.record_attempt(new_mastery, was_correct, now);
        let level = record.level();

        self.state.recompute_subject(key.subject());
        self.state.count_interaction(was_correct);
        let newly_earned = self.state.evaluate_achievements(now);

        for id in &newly_earned {
            tracing::info!(achievement = %id, key = %self.storage_key, "achievement earned");
        }
        tracing::debug!(
            topic = %key,
            previous_mastery,
            new_mastery,
            was_correct,
            "mastery updated"
        );

        let persisted = self.persist().await;
        Ok(MasteryUpdate {
            previous_mastery,
            new_mastery,
            level,
            newly_earned,
            persisted,
        })
    }

    /// Append a finished quiz to the history, keeping the newest entries.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidQuiz` if `score > total`.
    pub async fn record_quiz(
        &mut self,
        subject: &str,
        question_count: u32,
        score: u32,
        total: u32,
    ) -> Result<QuizRecord, TrackerError> {
        let result = QuizResult::new(subject, question_count, score, total, self.clock.now())?;
        self.state.push_quiz(result.clone());
        let persisted = self.persist().await;
        Ok(QuizRecord { result, persisted })
    }

    /// Replace the state with an empty one and save it.
    ///
    /// Returns whether the save succeeded.
    pub async fn reset_progress(&mut self) -> bool {
        self.state = ProgressState::default();
        tracing::info!(key = %self.storage_key, "progress reset");
        self.persist().await
    }

    /// Save the current state, surfacing any failure.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the backend rejects the save.
    pub async fn flush(&self) -> Result<(), TrackerError> {
        self.repo.save(&self.storage_key, &self.state).await?;
        Ok(())
    }

    async fn persist(&self) -> bool {
        match self.repo.save(&self.storage_key, &self.state).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, key = %self.storage_key, "failed to persist progress");
                false
            }
        }
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    /// Zeroed view if the topic was never attempted.
    #[must_use]
    pub fn topic_mastery(&self, subject: &str, topic: &str) -> TopicMastery {
        self.state
            .topic(subject, topic)
            .map_or_else(TopicMastery::unseen, TopicMastery::from_record)
    }

    /// Zeroed view if the subject was never attempted.
    #[must_use]
    pub fn subject_mastery(&self, subject: &str) -> SubjectMastery {
        self.state
            .subject(subject)
            .map_or_else(|| SubjectMastery::unseen(subject), SubjectMastery::from_record)
    }

    /// The `n` attempted topics with the lowest mastery, lowest first.
    ///
    /// Ties keep first-seen order.
    #[must_use]
    pub fn weak_areas(&self, n: usize) -> Vec<AreaSummary> {
        let mut areas = self.attempted_areas();
        areas.sort_by(|a, b| a.mastery.total_cmp(&b.mastery));
        areas.truncate(n);
        areas
    }

    /// The `n` attempted topics with the highest mastery, highest first.
    ///
    /// Ties keep first-seen order.
    #[must_use]
    pub fn strong_areas(&self, n: usize) -> Vec<AreaSummary> {
        let mut areas = self.attempted_areas();
        areas.sort_by(|a, b| b.mastery.total_cmp(&a.mastery));
        areas.truncate(n);
        areas
    }

    fn attempted_areas(&self) -> Vec<AreaSummary> {
        self.state
            .topics()
            .iter()
            .filter(|r| r.interactions() > 0)
            .map(AreaSummary::from_record)
            .collect()
    }

    #[must_use]
    pub fn overall_stats(&self) -> OverallStats {
        let total_interactions = self.state.total_interactions();
        let total_correct = self.state.total_correct();

        #[allow(clippy::cast_precision_loss)]
        let accuracy = if total_interactions == 0 {
            0.0
        } else {
            round_one_decimal(total_correct as f64 / total_interactions as f64 * 100.0)
        };
        let average_mastery = self.state.average_subject_mastery();

        OverallStats {
            total_interactions,
            total_correct,
            accuracy,
            average_mastery,
            mastery_level: MasteryLevel::from_mastery(average_mastery),
            topics_studied: self.state.topics().len(),
            subjects_studied: self.state.subjects().len(),
            quizzes_taken: self.state.quiz_history().len(),
            achievements_earned: self.state.achievements().len(),
        }
    }

    #[must_use]
    pub fn progress_summary(&self) -> ProgressSummary {
        let mut subjects: Vec<SubjectMastery> = self
            .state
            .subjects()
            .iter()
            .map(SubjectMastery::from_record)
            .collect();
        subjects.sort_by(|a, b| b.mastery.total_cmp(&a.mastery));

        ProgressSummary {
            stats: self.overall_stats(),
            weak_areas: self.weak_areas(SUMMARY_AREA_COUNT),
            strong_areas: self.strong_areas(SUMMARY_AREA_COUNT),
            subjects,
            recent_quizzes: self.recent_quizzes(SUMMARY_RECENT_QUIZZES),
            achievements: self.state.achievements().to_vec(),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("storage_key", &self.storage_key)
            .field("topics_len", &self.state.topics().len())
            .field("total_interactions", &self.state.total_interactions())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

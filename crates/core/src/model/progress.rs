use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::achievement::{Achievement, AchievementId};
use crate::model::ids::TopicKey;
use crate::model::mastery::{SubjectRecord, TopicRecord, mean};

/// Maximum number of quiz results kept in history.
pub const QUIZ_HISTORY_LIMIT: usize = 50;

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// One finished quiz in the learner's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub subject: String,
    pub question_count: u32,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub timestamp: DateTime<Utc>,
}

impl QuizResult {
    /// Builds a result, deriving `percentage` from `score / total`.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::ScoreExceedsTotal` if `score > total`.
    pub fn new(
        subject: impl Into<String>,
        question_count: u32,
        score: u32,
        total: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if score > total {
            return Err(QuizResultError::ScoreExceedsTotal { score, total });
        }
        let percentage = if total == 0 {
            0.0
        } else {
            f64::from(score) / f64::from(total) * 100.0
        };
        Ok(Self {
            subject: subject.into(),
            question_count,
            score,
            total,
            percentage,
            timestamp,
        })
    }
}

//
// ─── PROGRESS STATE ────────────────────────────────────────────────────────────
//

/// Everything known about one learner, persisted as a single document.
///
/// Topics and subjects keep first-seen order so ties in rankings resolve
/// the same way on every load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    subjects: Vec<SubjectRecord>,
    topics: Vec<TopicRecord>,
    quiz_history: Vec<QuizResult>,
    total_interactions: u64,
    total_correct: u64,
    achievements: Vec<Achievement>,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subjects(&self) -> &[SubjectRecord] {
        &self.subjects
    }

    #[must_use]
    pub fn topics(&self) -> &[TopicRecord] {
        &self.topics
    }

    #[must_use]
    pub fn quiz_history(&self) -> &[QuizResult] {
        &self.quiz_history
    }

    #[must_use]
    pub fn total_interactions(&self) -> u64 {
        self.total_interactions
    }

    #[must_use]
    pub fn total_correct(&self) -> u64 {
        self.total_correct
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn topic(&self, subject: &str, topic: &str) -> Option<&TopicRecord> {
        self.topics.iter().find(|r| r.key().matches(subject, topic))
    }

    #[must_use]
    pub fn subject(&self, name: &str) -> Option<&SubjectRecord> {
        self.subjects.iter().find(|s| s.name() == name.trim())
    }

    /// Returns the record for `key`, inserting one at `initial_mastery` if unseen.
    pub fn topic_entry(&mut self, key: &TopicKey, initial_mastery: f64) -> &mut TopicRecord {
        let idx = match self.topics.iter().position(|r| r.key() == key) {
            Some(idx) => idx,
            None => {
                self.topics
                    .push(TopicRecord::new(key.clone(), initial_mastery));
                self.topics.len() - 1
            }
        };
        &mut self.topics[idx]
    }

    /// Rebuilds the aggregate for `subject` from its topics.
    pub fn recompute_subject(&mut self, subject: &str) {
        let masteries: Vec<f64> = self
            .topics
            .iter()
            .filter(|r| r.subject() == subject)
            .map(TopicRecord::mastery)
            .collect();

        let position = self.subjects.iter().position(|s| s.name() == subject);
        if masteries.is_empty() {
            if let Some(idx) = position {
                self.subjects.remove(idx);
            }
            return;
        }

        let record = SubjectRecord::from_topics(subject, &masteries);
        match position {
            Some(idx) => self.subjects[idx] = record,
            None => self.subjects.push(record),
        }
    }

    /// Adds one graded attempt to the global counters.
    pub fn count_interaction(&mut self, was_correct: bool) {
        self.total_interactions = self.total_interactions.saturating_add(1);
        if was_correct {
            self.total_correct = self.total_correct.saturating_add(1);
        }
    }

    /// Highest topic mastery, 0 when no topic exists.
    #[must_use]
    pub fn best_topic_mastery(&self) -> f64 {
        self.topics
            .iter()
            .map(TopicRecord::mastery)
            .fold(0.0, f64::max)
    }

    /// Mean of all subject masteries, 0 when no subject exists.
    #[must_use]
    pub fn average_subject_mastery(&self) -> f64 {
        let masteries: Vec<f64> = self.subjects.iter().map(SubjectRecord::mastery).collect();
        mean(&masteries)
    }

    #[must_use]
    pub fn has_achievement(&self, id: AchievementId) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    /// Records `id` as earned. Returns false if it was already present.
    pub fn award(&mut self, id: AchievementId, at: DateTime<Utc>) -> bool {
        if self.has_achievement(id) {
            return false;
        }
        self.achievements.push(Achievement::earned(id, at));
        true
    }

    /// Awards every milestone whose rule now holds, in evaluation order.
    ///
    /// Returns only the newly earned ids.
    pub fn evaluate_achievements(&mut self, at: DateTime<Utc>) -> Vec<AchievementId> {
        let total = self.total_interactions;
        let best = self.best_topic_mastery();
        AchievementId::ALL
            .into_iter()
            .filter(|id| id.is_met(total, best))
            .filter(|id| self.award(*id, at))
            .collect()
    }

    /// Appends a quiz result, evicting the oldest entries beyond the limit.
    pub fn push_quiz(&mut self, result: QuizResult) {
        self.quiz_history.push(result);
        if self.quiz_history.len() > QUIZ_HISTORY_LIMIT {
            let overflow = self.quiz_history.len() - QUIZ_HISTORY_LIMIT;
            self.quiz_history.drain(..overflow);
        }
    }

    /// Restores invariants on a state read from storage.
    ///
    /// Topics with a blank subject or topic are dropped and duplicate keys
    /// keep only their first record. Mastery is clamped, counters capped,
    /// history trimmed, duplicate achievements dropped, and every subject
    /// aggregate recomputed.
    pub fn repair(&mut self) {
        let mut keys: Vec<TopicKey> = Vec::with_capacity(self.topics.len());
        self.topics.retain_mut(|topic| {
            if !topic.repair() || keys.contains(topic.key()) {
                return false;
            }
            keys.push(topic.key().clone());
            true
        });
        self.total_correct = self.total_correct.min(self.total_interactions);

        if self.quiz_history.len() > QUIZ_HISTORY_LIMIT {
            let overflow = self.quiz_history.len() - QUIZ_HISTORY_LIMIT;
            self.quiz_history.drain(..overflow);
        }

        let mut seen = Vec::with_capacity(self.achievements.len());
        self.achievements.retain(|a| {
            if seen.contains(&a.id) {
                false
            } else {
                seen.push(a.id);
                true
            }
        });

        let mut names: Vec<String> = self.subjects.iter().map(|s| s.name().to_owned()).collect();
        for topic in &self.topics {
            if !names.iter().any(|n| n == topic.subject()) {
                names.push(topic.subject().to_owned());
            }
        }
        for name in names {
            self.recompute_subject(&name);
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn key(subject: &str, topic: &str) -> TopicKey {
        TopicKey::new(subject, topic).unwrap()
    }

    #[test]
    fn quiz_result_derives_percentage() {
        let result = QuizResult::new("Math", 5, 4, 5, fixed_now()).unwrap();
        assert_eq!(result.percentage, 80.0);

        let empty = QuizResult::new("Math", 0, 0, 0, fixed_now()).unwrap();
        assert_eq!(empty.percentage, 0.0);
    }

    #[test]
    fn quiz_result_rejects_score_above_total() {
        let err = QuizResult::new("Math", 3, 4, 3, fixed_now()).unwrap_err();
        assert_eq!(err, QuizResultError::ScoreExceedsTotal { score: 4, total: 3 });
    }

    #[test]
    fn topic_entry_inserts_once_in_first_seen_order() {
        let mut state = ProgressState::new();
        state.topic_entry(&key("Math", "B"), 0.1);
        state.topic_entry(&key("Math", "A"), 0.1);
        state.topic_entry(&key("Math", "B"), 0.1);

        let topics: Vec<&str> = state.topics().iter().map(TopicRecord::topic).collect();
        assert_eq!(topics, vec!["B", "A"]);
    }

    #[test]
    fn subject_tracks_mean_of_topics() {
        let mut state = ProgressState::new();
        state
            .topic_entry(&key("Math", "A"), 0.1)
            .record_attempt(0.6, true, fixed_now());
        state
            .topic_entry(&key("Math", "B"), 0.1)
            .record_attempt(0.2, false, fixed_now());
        state.recompute_subject("Math");

        let subject = state.subject("Math").unwrap();
        assert!((subject.mastery() - 0.4).abs() < 1e-12);
        assert_eq!(subject.topic_count(), 2);
        assert!((state.average_subject_mastery() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn history_keeps_most_recent_fifty() {
        let mut state = ProgressState::new();
        for i in 0..60 {
            let at = fixed_now() + Duration::minutes(i);
            state.push_quiz(QuizResult::new(format!("S{i}"), 1, 1, 1, at).unwrap());
        }
        assert_eq!(state.quiz_history().len(), QUIZ_HISTORY_LIMIT);
        assert_eq!(state.quiz_history()[0].subject, "S10");
        assert_eq!(state.quiz_history()[49].subject, "S59");
    }

    #[test]
    fn award_is_idempotent() {
        let mut state = ProgressState::new();
        assert!(state.award(AchievementId::FirstStep, fixed_now()));
        assert!(!state.award(AchievementId::FirstStep, fixed_now()));
        assert_eq!(state.achievements().len(), 1);
    }

    #[test]
    fn evaluate_awards_in_rule_order() {
        let mut state = ProgressState::new();
        state
            .topic_entry(&key("Math", "A"), 0.1)
            .record_attempt(0.9, true, fixed_now());
        state.count_interaction(true);

        let earned = state.evaluate_achievements(fixed_now());
        assert_eq!(
            earned,
            vec![AchievementId::FirstStep, AchievementId::FirstExpert]
        );
        assert!(state.evaluate_achievements(fixed_now()).is_empty());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut state = ProgressState::new();
        state
            .topic_entry(&key("Math", "A"), 0.1)
            .record_attempt(0.5, true, fixed_now());
        state.count_interaction(true);
        state.recompute_subject("Math");

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["totalInteractions"], 1);
        assert_eq!(json["topics"][0]["subject"], "Math");
        assert_eq!(json["subjects"][0]["topicCount"], 1);

        let back: ProgressState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let state: ProgressState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, ProgressState::default());
    }

    #[test]
    fn repair_fixes_inconsistent_snapshot() {
        let json = r#"{
            "subjects": [],
            "topics": [{"subject":"Math","topic":"A","mastery":2.0,"interactions":2,"correct":1,"lastInteraction":null}],
            "totalInteractions": 2,
            "totalCorrect": 9,
            "achievements": [
                {"id":"first_step","name":"First Step","description":"x","earnedAt":"2023-11-14T22:13:20Z"},
                {"id":"first_step","name":"First Step","description":"x","earnedAt":"2023-11-14T22:13:20Z"}
            ]
        }"#;
        let mut state: ProgressState = serde_json::from_str(json).unwrap();
        state.repair();

        assert_eq!(state.topics()[0].mastery(), 1.0);
        assert_eq!(state.total_correct(), 2);
        assert_eq!(state.achievements().len(), 1);
        assert_eq!(state.subject("Math").unwrap().mastery(), 1.0);
    }

    #[test]
    fn repair_drops_blank_and_duplicate_topics() {
        let json = r#"{
            "subjects": [{"name":"","mastery":0.5,"topicCount":1}],
            "topics": [
                {"subject":"Math","topic":"F","mastery":0.9,"interactions":1,"correct":1,"lastInteraction":null},
                {"subject":" Math","topic":"F ","mastery":0.1,"interactions":1,"correct":0,"lastInteraction":null},
                {"subject":"","topic":"","mastery":0.5,"interactions":0,"correct":0,"lastInteraction":null}
            ]
        }"#;
        let mut state: ProgressState = serde_json::from_str(json).unwrap();
        state.repair();

        assert_eq!(state.topics().len(), 1);
        assert_eq!(state.topics()[0].mastery(), 0.9);
        assert_eq!(state.subjects().len(), 1);
        let math = state.subject("Math").unwrap();
        assert_eq!(math.topic_count(), 1);
        assert_eq!(math.mastery(), 0.9);
    }
}

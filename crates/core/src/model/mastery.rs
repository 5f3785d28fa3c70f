use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::TopicKey;

//
// ─── MASTERY LEVEL ─────────────────────────────────────────────────────────────
//

/// Qualitative band for a mastery estimate.
///
/// Bands are half-open `[lo, hi)` steps of 0.2, except `Expert` which
/// covers `[0.8, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Novice,
    Beginner,
    Intermediate,
    Proficient,
    Expert,
}

impl MasteryLevel {
    /// Classifies a mastery value. NaN is treated as `Novice`.
    #[must_use]
    pub fn from_mastery(mastery: f64) -> Self {
        if mastery >= 0.8 {
            Self::Expert
        } else if mastery >= 0.6 {
            Self::Proficient
        } else if mastery >= 0.4 {
            Self::Intermediate
        } else if mastery >= 0.2 {
            Self::Beginner
        } else {
            Self::Novice
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MasteryLevel::Novice => "Novice",
            MasteryLevel::Beginner => "Beginner",
            MasteryLevel::Intermediate => "Intermediate",
            MasteryLevel::Proficient => "Proficient",
            MasteryLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── TOPIC RECORD ──────────────────────────────────────────────────────────────
//

/// Running mastery estimate and attempt counters for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    #[serde(flatten)]
    key: TopicKey,
    mastery: f64,
    interactions: u32,
    correct: u32,
    last_interaction: Option<DateTime<Utc>>,
}

impl TopicRecord {
    /// Unseen topic starting at `initial_mastery`.
    #[must_use]
    pub fn new(key: TopicKey, initial_mastery: f64) -> Self {
        Self {
            key,
            mastery: initial_mastery.clamp(0.0, 1.0),
            interactions: 0,
            correct: 0,
            last_interaction: None,
        }
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
    pub fn mastery(&self) -> f64 {
        self.mastery
    }

    #[must_use]
    pub fn level(&self) -> MasteryLevel {
        MasteryLevel::from_mastery(self.mastery)
    }

    #[must_use]
    pub fn interactions(&self) -> u32 {
        self.interactions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn last_interaction(&self) -> Option<DateTime<Utc>> {
        self.last_interaction
    }

    /// Share of correct attempts as a percentage, 0 when unseen.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.interactions == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.interactions) * 100.0
        }
    }

    /// Stores a new estimate and bumps the counters for one graded attempt.
    pub fn record_attempt(&mut self, new_mastery: f64, was_correct: bool, at: DateTime<Utc>) {
        self.mastery = new_mastery.clamp(0.0, 1.0);
        self.interactions = self.interactions.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.last_interaction = Some(at);
    }

    /// Restores invariants on a record read from untrusted storage.
    ///
    /// Returns false if the key has a blank subject or topic, in which case
    /// the record should be discarded.
    pub(crate) fn repair(&mut self) -> bool {
        match TopicKey::new(self.key.subject(), self.key.topic()) {
            Ok(key) => self.key = key,
            Err(_) => return false,
        }
        self.mastery = if self.mastery.is_nan() {
            0.0
        } else {
            self.mastery.clamp(0.0, 1.0)
        };
        self.correct = self.correct.min(self.interactions);
        true
    }
}

//
// ─── SUBJECT RECORD ────────────────────────────────────────────────────────────
//

/// Subject-level aggregate derived from its topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    name: String,
    mastery: f64,
    topic_count: u32,
}

impl SubjectRecord {
    /// Builds the aggregate as the arithmetic mean of `topic_masteries`.
    #[must_use]
    pub fn from_topics(name: impl Into<String>, topic_masteries: &[f64]) -> Self {
        let mastery = mean(topic_masteries);
        Self {
            name: name.into(),
            mastery,
            topic_count: u32::try_from(topic_masteries.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mastery(&self) -> f64 {
        self.mastery
    }

    #[must_use]
    pub fn level(&self) -> MasteryLevel {
        MasteryLevel::from_mastery(self.mastery)
    }

    #[must_use]
    pub fn topic_count(&self) -> u32 {
        self.topic_count
    }
}

/// Arithmetic mean, 0 for an empty slice.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

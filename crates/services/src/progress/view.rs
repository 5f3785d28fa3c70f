use tutor_core::model::{
    Achievement, AchievementId, MasteryLevel, QuizResult, SubjectRecord, TopicRecord,
};

/// Outcome of folding one graded attempt into a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryUpdate {
    pub previous_mastery: f64,
    pub new_mastery: f64,
    pub level: MasteryLevel,
    /// Achievements earned by this attempt, in evaluation order.
    pub newly_earned: Vec<AchievementId>,
    /// False if the state could not be saved; the in-memory update still applies.
    pub persisted: bool,
}

/// Read-only view of one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMastery {
    pub mastery: f64,
    pub level: MasteryLevel,
    pub interactions: u32,
    /// Percentage of correct attempts.
    pub accuracy: f64,
}

impl TopicMastery {
    pub(crate) fn unseen() -> Self {
        Self {
            mastery: 0.0,
            level: MasteryLevel::Novice,
            interactions: 0,
            accuracy: 0.0,
        }
    }

    pub(crate) fn from_record(record: &TopicRecord) -> Self {
        Self {
            mastery: record.mastery(),
            level: record.level(),
            interactions: record.interactions(),
            accuracy: record.accuracy(),
        }
    }
}

/// Read-only view of one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectMastery {
    pub subject: String,
    pub mastery: f64,
    pub level: MasteryLevel,
    pub topic_count: u32,
}

impl SubjectMastery {
    pub(crate) fn unseen(subject: &str) -> Self {
        Self {
            subject: subject.to_owned(),
            mastery: 0.0,
            level: MasteryLevel::Novice,
            topic_count: 0,
        }
    }

    pub(crate) fn from_record(record: &SubjectRecord) -> Self {
        Self {
            subject: record.name().to_owned(),
            mastery: record.mastery(),
            level: record.level(),
            topic_count: record.topic_count(),
        }
    }
}

/// A topic listed among the weakest or strongest areas.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub subject: String,
    pub topic: String,
    pub mastery: f64,
    pub level: MasteryLevel,
    pub interactions: u32,
}

impl AreaSummary {
    pub(crate) fn from_record(record: &TopicRecord) -> Self {
        Self {
            subject: record.subject().to_owned(),
            topic: record.topic().to_owned(),
            mastery: record.mastery(),
            level: record.level(),
            interactions: record.interactions(),
        }
    }
}

/// A recorded quiz plus whether the save succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRecord {
    pub result: QuizResult,
    pub persisted: bool,
}

/// Learner-wide totals.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallStats {
    pub total_interactions: u64,
    pub total_correct: u64,
    /// Percentage of correct attempts rounded to one decimal place.
    pub accuracy: f64,
    /// Mean of subject masteries.
    pub average_mastery: f64,
    pub mastery_level: MasteryLevel,
    pub topics_studied: usize,
    pub subjects_studied: usize,
    pub quizzes_taken: usize,
    pub achievements_earned: usize,
}

impl OverallStats {
    /// Accuracy formatted with exactly one decimal, e.g. `"0.0"`.
    #[must_use]
    pub fn accuracy_label(&self) -> String {
        format!("{:.1}", self.accuracy)
    }
}

/// Dashboard view combining stats, rankings and history.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub stats: OverallStats,
    pub weak_areas: Vec<AreaSummary>,
    pub strong_areas: Vec<AreaSummary>,
    /// Subjects by mastery, highest first.
    pub subjects: Vec<SubjectMastery>,
    pub recent_quizzes: Vec<QuizResult>,
    pub achievements: Vec<Achievement>,
}

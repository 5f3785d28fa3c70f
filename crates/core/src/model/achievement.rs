use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mastery reached by a topic to count as expert-level for `FirstExpert`.
const EXPERT_THRESHOLD: f64 = 0.8;

/// Milestones a learner can earn once.
///
/// Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    /// First graded interaction ever.
    FirstStep,
    /// Tenth graded interaction.
    GettingStarted,
    /// Hundredth graded interaction.
    Dedicated,
    /// First topic to reach expert mastery.
    FirstExpert,
}

impl AchievementId {
    pub const ALL: [AchievementId; 4] = [
        AchievementId::FirstStep,
        AchievementId::GettingStarted,
        AchievementId::Dedicated,
        AchievementId::FirstExpert,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstStep => "first_step",
            AchievementId::GettingStarted => "getting_started",
            AchievementId::Dedicated => "dedicated",
            AchievementId::FirstExpert => "first_expert",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AchievementId::FirstStep => "First Step",
            AchievementId::GettingStarted => "Getting Started",
            AchievementId::Dedicated => "Dedicated Learner",
            AchievementId::FirstExpert => "Expert",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            AchievementId::FirstStep => "Answered your first question",
            AchievementId::GettingStarted => "Answered 10 questions",
            AchievementId::Dedicated => "Answered 100 questions",
            AchievementId::FirstExpert => "Reached expert level in a topic",
        }
    }

    /// Whether the rule for this milestone holds.
    ///
    /// `total_interactions` is the global count after the latest attempt and
    /// `best_topic_mastery` the highest mastery over all topics.
    #[must_use]
    pub fn is_met(self, total_interactions: u64, best_topic_mastery: f64) -> bool {
        match self {
            AchievementId::FirstStep => total_interactions == 1,
            AchievementId::GettingStarted => total_interactions == 10,
            AchievementId::Dedicated => total_interactions == 100,
            AchievementId::FirstExpert => best_topic_mastery >= EXPERT_THRESHOLD,
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An earned milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

impl Achievement {
    #[must_use]
    pub fn earned(id: AchievementId, earned_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: id.name().to_owned(),
            description: id.description().to_owned(),
            earned_at,
        }
    }
}

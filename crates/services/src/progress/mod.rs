mod tracker;
mod view;

pub use tracker::{DEFAULT_AREA_LIMIT, ProgressTracker, SharedTracker};
pub use view::{
    AreaSummary, MasteryUpdate, OverallStats, ProgressSummary, QuizRecord, SubjectMastery,
    TopicMastery,
};

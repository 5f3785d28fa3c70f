use chrono::Duration;
use storage::repository::{ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{AchievementId, ProgressState, QuizResult, TopicKey};
use tutor_core::time::fixed_now;

fn studied_state() -> ProgressState {
    let mut state = ProgressState::new();
    let now = fixed_now();
    for (topic, mastery, correct) in [("Fractions", 0.53, true), ("Decimals", 0.16, false)] {
        let key = TopicKey::new("Math", topic).unwrap();
        state.topic_entry(&key, 0.1).record_attempt(mastery, correct, now);
        state.count_interaction(correct);
    }
    state.recompute_subject("Math");
    state.award(AchievementId::FirstStep, now);
    state.push_quiz(QuizResult::new("Math", 2, 1, 2, now + Duration::minutes(3)).unwrap());
    state
}

#[tokio::test]
async fn sqlite_roundtrips_progress_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load("learner-1").await.unwrap().is_none());

    let state = studied_state();
    repo.save("learner-1", &state).await.unwrap();

    let loaded = repo.load("learner-1").await.unwrap().expect("stored");
    assert_eq!(loaded, state);
    assert_eq!(loaded.topics()[0].topic(), "Fractions");
    assert_eq!(loaded.quiz_history().len(), 1);
    assert!(loaded.has_achievement(AchievementId::FirstStep));
}

#[tokio::test]
async fn sqlite_save_overwrites_and_delete_removes() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice is a no-op.
    repo.migrate().await.expect("migrate again");

    repo.save("a", &studied_state()).await.unwrap();
    repo.save("a", &ProgressState::new()).await.unwrap();
    repo.save("b", &studied_state()).await.unwrap();

    let a = repo.load("a").await.unwrap().unwrap();
    assert_eq!(a.total_interactions(), 0);
    assert_eq!(repo.keys().await.unwrap(), vec!["a", "b"]);

    repo.delete("a").await.unwrap();
    assert!(repo.load("a").await.unwrap().is_none());
    assert!(matches!(
        repo.delete("a").await.unwrap_err(),
        StorageError::NotFound
    ));
}

#[tokio::test]
async fn sqlite_reports_corrupt_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query(
        "INSERT INTO progress_snapshots (storage_key, state_json, total_interactions, updated_at)
         VALUES ('broken', '{not json', 0, '2023-11-14T22:13:20Z')",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo.load("broken").await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::ProgressState;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence contract for a learner's progress document.
///
/// Each storage key holds one whole `ProgressState`; `save` replaces it.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the state stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the stored
    /// document cannot be decoded. A missing key is `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<ProgressState>, StorageError>;

    /// Persist `state` under `key`, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be encoded or written.
    async fn save(&self, key: &str, state: &ProgressState) -> Result<(), StorageError>;

    /// Remove the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List every key that currently holds a document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    states: Arc<Mutex<HashMap<String, ProgressState>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self, key: &str) -> Result<Option<ProgressState>, StorageError> {
        let guard = self
            .states
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn save(&self, key: &str, state: &ProgressState) -> Result<(), StorageError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), state.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self
            .states
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Progress backend behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::TopicKey;
    use tutor_core::time::fixed_now;

    fn sample_state() -> ProgressState {
        let mut state = ProgressState::new();
        let key = TopicKey::new("Math", "Fractions").unwrap();
        state
            .topic_entry(&key, 0.1)
            .record_attempt(0.53, true, fixed_now());
        state.count_interaction(true);
        state.recompute_subject("Math");
        state
    }

    #[tokio::test]
    async fn round_trips_state_by_key() {
        let repo = InMemoryRepository::new();
        assert!(repo.load("alice").await.unwrap().is_none());

        let state = sample_state();
        repo.save("alice", &state).await.unwrap();

        assert_eq!(repo.load("alice").await.unwrap(), Some(state));
        assert!(repo.load("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_document() {
        let repo = InMemoryRepository::new();
        repo.save("alice", &sample_state()).await.unwrap();
        repo.save("alice", &ProgressState::new()).await.unwrap();

        let loaded = repo.load("alice").await.unwrap().unwrap();
        assert_eq!(loaded.total_interactions(), 0);
    }

    #[tokio::test]
    async fn delete_and_keys() {
        let repo = InMemoryRepository::new();
        repo.save("b", &ProgressState::new()).await.unwrap();
        repo.save("a", &ProgressState::new()).await.unwrap();
        assert_eq!(repo.keys().await.unwrap(), vec!["a", "b"]);

        repo.delete("a").await.unwrap();
        assert!(matches!(
            repo.delete("a").await.unwrap_err(),
            StorageError::NotFound
        ));
        assert_eq!(repo.keys().await.unwrap(), vec!["b"]);
    }
}

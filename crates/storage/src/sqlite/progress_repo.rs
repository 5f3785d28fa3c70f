use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tutor_core::model::ProgressState;

use super::SqliteRepository;
use super::mapping::{decode_state, encode_state, ser, total_to_i64};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(&self, key: &str) -> Result<Option<ProgressState>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT state_json
                FROM progress_snapshots
                WHERE storage_key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row.try_get("state_json").map_err(ser)?;
        decode_state(&json).map(Some)
    }

    async fn save(&self, key: &str, state: &ProgressState) -> Result<(), StorageError> {
        let json = encode_state(state)?;

        sqlx::query(
            r"
                INSERT INTO progress_snapshots (
                    storage_key, state_json, total_interactions, updated_at
                )
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(storage_key) DO UPDATE SET
                    state_json = excluded.state_json,
                    total_interactions = excluded.total_interactions,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(json)
        .bind(total_to_i64(state)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM progress_snapshots WHERE storage_key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT storage_key FROM progress_snapshots ORDER BY storage_key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("storage_key").map_err(ser))
            .collect()
    }
}

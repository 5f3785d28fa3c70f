use tutor_core::model::ProgressState;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn encode_state(state: &ProgressState) -> Result<String, StorageError> {
    serde_json::to_string(state).map_err(ser)
}

/// Decodes a stored snapshot and restores its invariants.
pub(crate) fn decode_state(json: &str) -> Result<ProgressState, StorageError> {
    let mut state: ProgressState = serde_json::from_str(json).map_err(ser)?;
    state.repair();
    Ok(state)
}

pub(crate) fn total_to_i64(state: &ProgressState) -> Result<i64, StorageError> {
    i64::try_from(state.total_interactions())
        .map_err(|_| StorageError::Serialization("total_interactions overflow".into()))
}

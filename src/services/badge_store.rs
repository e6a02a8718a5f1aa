//! Per-user badge state, kept apart from the relational store.

use std::collections::HashMap;
use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::response::AppError;
use crate::services::badge::BadgeState;

#[derive(Debug, Error)]
pub enum BadgeStoreError {
    #[error("badge store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("badge state is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("badge store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<BadgeStoreError> for AppError {
    fn from(err: BadgeStoreError) -> Self {
        AppError::internal(err.to_string())
    }
}

pub trait BadgeStore: Send + Sync {
    /// `Ok(None)` when the user has no state yet.
    fn load(&self, user_id: &str) -> Result<Option<BadgeState>, BadgeStoreError>;
    fn save(&self, user_id: &str, state: &BadgeState) -> Result<(), BadgeStoreError>;
}

/// One JSON document per user under a directory.
pub struct FileBadgeStore {
    dir: PathBuf,
}

impl FileBadgeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        let digest = Sha256::digest(user_id.as_bytes());
        self.dir
            .join(format!("{}.json", URL_SAFE_NO_PAD.encode(digest)))
    }
}

impl BadgeStore for FileBadgeStore {
    fn load(&self, user_id: &str) -> Result<Option<BadgeState>, BadgeStoreError> {
        let path = self.path_for(user_id);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn save(&self, user_id: &str, state: &BadgeState) -> Result<(), BadgeStoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(user_id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBadgeStore {
    states: RwLock<HashMap<String, BadgeState>>,
}

impl MemoryBadgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BadgeStore for MemoryBadgeStore {
    fn load(&self, user_id: &str) -> Result<Option<BadgeState>, BadgeStoreError> {
        Ok(self.states.read().get(user_id).cloned())
    }

    fn save(&self, user_id: &str, state: &BadgeState) -> Result<(), BadgeStoreError> {
        self.states
            .write()
            .insert(user_id.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = BadgeState::default();
        state.stats.words_added = 7;

        FileBadgeStore::new(dir.path()).save("user/1", &state).unwrap();

        let loaded = FileBadgeStore::new(dir.path()).load("user/1").unwrap().unwrap();
        assert_eq!(loaded.stats.words_added, 7);
        assert!(FileBadgeStore::new(dir.path()).load("user/2").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBadgeStore::new(dir.path());
        std::fs::write(store.path_for("u"), b"{not json").unwrap();
        assert!(matches!(store.load("u"), Err(BadgeStoreError::Serde(_))));
    }
}

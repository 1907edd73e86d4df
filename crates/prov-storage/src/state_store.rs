//! State store (C4): snapshot a `ResultsMap` keyed by
//! `{project}-{deployment_id}-{account}` for later reverse-order teardown.
//!
//! Grounded on the original's `SaveStateToStorage`/`LoadStateFromStorage`
//! (one JSON file per key), generalized behind a trait so a future
//! object-storage or relational backend is a drop-in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use prov_core::ResultsMap;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, key: &str, results: &ResultsMap) -> Result<()>;
    async fn load(&self, key: &str) -> Result<ResultsMap>;
}

/// Local-filesystem backend: one JSON file per snapshot key under `root_dir`.
/// This is the default backend; it stores overwrite-on-save semantics
/// identically to the original's per-project file.
pub struct FileStateStore {
    root_dir: PathBuf,
}

impl FileStateStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn save(&self, key: &str, results: &ResultsMap) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        let path = self.path_for(key);
        let data = serde_json::to_vec_pretty(results)?;

        if path_exists(&path).await {
            debug!(%key, path = %path.display(), "removing existing snapshot before overwrite");
            tokio::fs::remove_file(&path).await?;
        }

        tokio::fs::write(&path, data).await?;
        info!(%key, path = %path.display(), "snapshot saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<ResultsMap> {
        let path = self.path_for(key);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|_| StoreError::SnapshotNotFound(key.to_string()))?;
        let results = serde_json::from_slice(&data)?;
        Ok(results)
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        let mut results = ResultsMap::new();
        results.insert("A", json!({"id": "1"}).as_object().unwrap().clone());
        results.insert("B", json!({"id": "2"}).as_object().unwrap().clone());

        let key = prov_core::snapshot_key("proj", "dep-1", "acct");
        store.save(&key, &results).await.unwrap();

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded, results);
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        let err = store.load("does-not-exist").await.unwrap_err();
        assert!(matches!(err, StoreError::SnapshotNotFound(_)));
    }

    #[tokio::test]
    async fn save_overwrites_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        let mut first = ResultsMap::new();
        first.insert("A", json!({"id": "1"}).as_object().unwrap().clone());
        store.save("k", &first).await.unwrap();

        let mut second = ResultsMap::new();
        second.insert("A", json!({"id": "2"}).as_object().unwrap().clone());
        store.save("k", &second).await.unwrap();

        let loaded = store.load("k").await.unwrap();
        assert_eq!(loaded, second);
    }
}

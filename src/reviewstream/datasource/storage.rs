//! Storage gateway helpers and the local-file gateway
//!
//! Storage operations are retried a small fixed number of times on a fixed
//! interval; once the budget is exhausted the failure is surfaced as
//! [`StorageUnavailable`] and the caller continues without the artifact.
//! Storage never takes the pipeline down.

use crate::reviewstream::datasource::traits::StorageGateway;
use crate::reviewstream::error::{BoxedError, StorageUnavailable};
use async_trait::async_trait;
use log::warn;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Retry budget for gateway operations.
pub const STORAGE_RETRY_ATTEMPTS: u32 = 3;
/// Fixed delay between retry attempts.
pub const STORAGE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Fetch `key`, retrying transient failures up to the fixed budget.
pub async fn get_with_retry(
    gateway: &dyn StorageGateway,
    key: &str,
) -> Result<Vec<u8>, StorageUnavailable> {
    let mut last_err: Option<BoxedError> = None;
    for attempt in 1..=STORAGE_RETRY_ATTEMPTS {
        match gateway.get(key).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                warn!(
                    "Storage get '{}' failed (attempt {}/{}): {}",
                    key, attempt, STORAGE_RETRY_ATTEMPTS, e
                );
                last_err = Some(e);
                if attempt < STORAGE_RETRY_ATTEMPTS {
                    tokio::time::sleep(STORAGE_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(StorageUnavailable {
        key: key.to_string(),
        attempts: STORAGE_RETRY_ATTEMPTS,
        source: last_err.unwrap_or_else(|| "unknown storage failure".into()),
    })
}

/// Store `bytes` under `key`, retrying transient failures up to the fixed
/// budget.
pub async fn put_with_retry(
    gateway: &dyn StorageGateway,
    key: &str,
    bytes: &[u8],
) -> Result<(), StorageUnavailable> {
    let mut last_err: Option<BoxedError> = None;
    for attempt in 1..=STORAGE_RETRY_ATTEMPTS {
        match gateway.put(key, bytes).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    "Storage put '{}' failed (attempt {}/{}): {}",
                    key, attempt, STORAGE_RETRY_ATTEMPTS, e
                );
                last_err = Some(e);
                if attempt < STORAGE_RETRY_ATTEMPTS {
                    tokio::time::sleep(STORAGE_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(StorageUnavailable {
        key: key.to_string(),
        attempts: STORAGE_RETRY_ATTEMPTS,
        source: last_err.unwrap_or_else(|| "unknown storage failure".into()),
    })
}

/// Gateway that stages objects as files under a root directory.
///
/// Keys may contain `/` separators; parent directories are created on
/// demand. This is the staging area the batch binary uses for datasets and
/// exported artifacts.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        // Normalize the key into a relative path under the root.
        let relative: PathBuf = key
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .collect();
        self.root.join(relative)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageGateway for LocalFileStorage {
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxedError> {
        let path = self.resolve(key);
        fs::read(&path)
            .await
            .map_err(|e| format!("read '{}': {}", path.display(), e).into())
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BoxedError> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("mkdir '{}': {}", parent.display(), e))?;
        }
        fs::write(&path, bytes)
            .await
            .map_err(|e| format!("write '{}': {}", path.display(), e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviewstream::datasource::memory::InMemoryStorage;

    #[tokio::test]
    async fn test_local_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        storage
            .put("results/metrics.csv", b"mode,task\n")
            .await
            .unwrap();
        let bytes = storage.get("results/metrics.csv").await.unwrap();
        assert_eq!(bytes, b"mode,task\n");
    }

    #[tokio::test]
    async fn test_local_file_storage_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        assert!(storage.get("absent").await.is_err());
    }

    #[tokio::test]
    async fn test_key_traversal_is_confined_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        storage.put("../escape.txt", b"x").await.unwrap();
        assert!(dir.path().join("escape.txt").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_retries_then_succeeds() {
        let storage = InMemoryStorage::new();
        storage.fail_next(2);
        put_with_retry(&storage, "artifact", b"data").await.unwrap();
        assert!(storage.contains("artifact"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhaustion_surfaces_storage_unavailable() {
        let storage = InMemoryStorage::new();
        storage.fail_next(10);
        let err = put_with_retry(&storage, "artifact", b"data")
            .await
            .unwrap_err();
        assert_eq!(err.attempts, STORAGE_RETRY_ATTEMPTS);
        assert!(err.to_string().contains("artifact"));
    }
}

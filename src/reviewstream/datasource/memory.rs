//! In-memory source, sink, and storage implementations
//!
//! Used by the demo binaries and the test suite. `InMemorySource` scripts
//! partition contents and failure behavior; `CollectingSink` captures
//! emissions for assertions; `InMemoryStorage` is a hash-map byte store
//! with optional fault injection for exercising the retry path.

use crate::reviewstream::datasource::traits::{ReviewSource, SnapshotSink, StorageGateway};
use crate::reviewstream::datasource::types::{
    Cursor, FetchBatch, PartitionId, RawRecord, StartPosition,
};
use crate::reviewstream::error::BoxedError;
use crate::reviewstream::model::{BatchReport, RawReview, WindowSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a wire-format review record (JSON payload bytes).
pub fn review_record(text: &str, sentiment: &str) -> RawRecord {
    let payload = RawReview {
        text: text.to_string(),
        sentiment: sentiment.to_string(),
    };
    // Serializing two plain strings cannot fail.
    let data = serde_json::to_vec(&payload).unwrap_or_default();
    RawRecord::new(data)
}

struct PartitionScript {
    records: Vec<RawRecord>,
    failing: bool,
}

/// Scriptable in-memory review source.
///
/// Each partition holds an append-only record log; cursors are plain
/// offsets into that log. Partitions can be marked as failing to simulate
/// a persistently broken shard.
#[derive(Default)]
pub struct InMemorySource {
    order: Vec<PartitionId>,
    partitions: Mutex<HashMap<PartitionId, PartitionScript>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition preloaded with records.
    pub fn with_partition(mut self, id: impl Into<String>, records: Vec<RawRecord>) -> Self {
        let id = PartitionId::new(id);
        self.order.push(id.clone());
        self.partitions
            .get_mut()
            .unwrap_or_else(|p| p.into_inner())
            .insert(
                id,
                PartitionScript {
                    records,
                    failing: false,
                },
            );
        self
    }

    /// Add a partition whose every operation fails.
    pub fn with_failing_partition(mut self, id: impl Into<String>) -> Self {
        let id = PartitionId::new(id);
        self.order.push(id.clone());
        self.partitions
            .get_mut()
            .unwrap_or_else(|p| p.into_inner())
            .insert(
                id,
                PartitionScript {
                    records: Vec::new(),
                    failing: true,
                },
            );
        self
    }

    /// Append a record to a live partition.
    pub fn push(&self, id: &PartitionId, record: RawRecord) {
        let mut partitions = self.lock();
        if let Some(script) = partitions.get_mut(id) {
            script.records.push(record);
        }
    }

    /// Clear the failing flag on a partition.
    pub fn heal_partition(&self, id: &PartitionId) {
        self.set_failing(id, false);
    }

    /// Mark a partition as failing.
    pub fn fail_partition(&self, id: &PartitionId) {
        self.set_failing(id, true);
    }

    fn set_failing(&self, id: &PartitionId, failing: bool) {
        let mut partitions = self.lock();
        if let Some(script) = partitions.get_mut(id) {
            script.failing = failing;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PartitionId, PartitionScript>> {
        self.partitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReviewSource for InMemorySource {
    async fn describe_partitions(&self) -> Result<Vec<PartitionId>, BoxedError> {
        Ok(self.order.clone())
    }

    async fn open_cursor(
        &self,
        partition: &PartitionId,
        position: StartPosition,
    ) -> Result<Cursor, BoxedError> {
        let partitions = self.lock();
        let Some(script) = partitions.get(partition) else {
            return Err(format!("unknown partition '{}'", partition).into());
        };
        if script.failing {
            return Err(format!("partition '{}' is unavailable", partition).into());
        }
        let offset = match position {
            StartPosition::Earliest => 0,
            StartPosition::Latest => script.records.len(),
        };
        Ok(Cursor::new(partition.clone(), offset.to_string()))
    }

    async fn fetch(&self, cursor: &Cursor, max_records: usize) -> Result<FetchBatch, BoxedError> {
        let partitions = self.lock();
        let Some(script) = partitions.get(&cursor.partition) else {
            return Err(format!("unknown partition '{}'", cursor.partition).into());
        };
        if script.failing {
            return Err(format!("partition '{}' is unavailable", cursor.partition).into());
        }
        let offset: usize = cursor
            .token
            .parse()
            .map_err(|_| format!("invalid cursor token '{}'", cursor.token))?;
        let end = (offset + max_records).min(script.records.len());
        let records = script.records[offset.min(end)..end].to_vec();
        let next = Cursor::new(cursor.partition.clone(), end.max(offset).to_string());
        Ok(FetchBatch {
            records,
            next_cursor: Some(next),
        })
    }
}

/// Sink that captures every emission, for tests and demos.
#[derive(Default)]
pub struct CollectingSink {
    snapshots: Mutex<Vec<WindowSnapshot>>,
    reports: Mutex<Vec<BatchReport>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<WindowSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn reports(&self) -> Vec<BatchReport> {
        self.reports
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl SnapshotSink for CollectingSink {
    async fn emit_snapshot(&self, snapshot: &WindowSnapshot) -> Result<(), BoxedError> {
        self.snapshots
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(snapshot.clone());
        Ok(())
    }

    async fn emit_report(&self, report: &BatchReport) -> Result<(), BoxedError> {
        self.reports
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(report.clone());
        Ok(())
    }
}

/// Hash-map byte store with optional fault injection.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_remaining: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` operations fail, then recover.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }

    fn check_fault(&self) -> Result<(), BoxedError> {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err("injected storage failure".into());
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxedError> {
        self.check_fault()?;
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no such object '{}'", key).into())
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BoxedError> {
        self.check_fault()?;
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cursor_walks_partition_in_order() {
        let source = InMemorySource::new().with_partition(
            "shard-0001",
            vec![
                review_record("first review", "positive"),
                review_record("second review", "negative"),
                review_record("third review", "neutral"),
            ],
        );
        let partitions = source.describe_partitions().await.unwrap();
        assert_eq!(partitions.len(), 1);

        let cursor = source
            .open_cursor(&partitions[0], StartPosition::Earliest)
            .await
            .unwrap();
        let batch = source.fetch(&cursor, 2).await.unwrap();
        assert_eq!(batch.records.len(), 2);

        let next = batch.next_cursor.unwrap();
        let rest = source.fetch(&next, 10).await.unwrap();
        assert_eq!(rest.records.len(), 1);

        // At the tail, fetches return empty batches and an unchanged cursor.
        let tail = rest.next_cursor.unwrap();
        let idle = source.fetch(&tail, 10).await.unwrap();
        assert!(idle.records.is_empty());
        assert_eq!(idle.next_cursor.unwrap(), tail);
    }

    #[tokio::test]
    async fn test_latest_skips_preloaded_records() {
        let source = InMemorySource::new()
            .with_partition("shard-0001", vec![review_record("old", "neutral")]);
        let partition = PartitionId::from("shard-0001");
        let cursor = source
            .open_cursor(&partition, StartPosition::Latest)
            .await
            .unwrap();
        assert!(source.fetch(&cursor, 10).await.unwrap().records.is_empty());

        source.push(&partition, review_record("new", "positive"));
        assert_eq!(source.fetch(&cursor, 10).await.unwrap().records.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_partition_errors_until_healed() {
        let source = InMemorySource::new().with_failing_partition("shard-0002");
        let partition = PartitionId::from("shard-0002");
        assert!(
            source
                .open_cursor(&partition, StartPosition::Earliest)
                .await
                .is_err()
        );
        source.heal_partition(&partition);
        assert!(
            source
                .open_cursor(&partition, StartPosition::Earliest)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_storage_fault_injection() {
        let storage = InMemoryStorage::new();
        storage.fail_next(1);
        assert!(storage.put("key", b"value").await.is_err());
        assert!(storage.put("key", b"value").await.is_ok());
        assert_eq!(storage.get("key").await.unwrap(), b"value");
    }
}

//! Record ingest adapter
//!
//! Pulls raw records from every partition of a [`ReviewSource`], converts
//! them to [`Event`]s (arrival timestamp, permissive tokenization, parsed
//! sentiment), and appends them to the sliding window store.
//!
//! Fault isolation rules:
//! - each partition cursor advances independently; a broken partition
//!   never blocks its siblings within the same sweep,
//! - per-partition failures are deduplicated: a partition reports its
//!   failure once per streak and goes quiet until it recovers,
//! - malformed records are dropped and counted, not treated as source
//!   failures.
//!
//! Events from the same partition keep source-local order; cross-partition
//! interleaving is unordered by design (see the window store docs).

use crate::reviewstream::config::StreamConfig;
use crate::reviewstream::datasource::traits::ReviewSource;
use crate::reviewstream::datasource::types::{Cursor, PartitionId, StartPosition};
use crate::reviewstream::error::IngestError;
use crate::reviewstream::model::{Event, RawReview, Sentiment};
use crate::reviewstream::tokenizer::TokenizerProfile;
use crate::reviewstream::window::SlidingWindowStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::time::timeout;

/// Live counters for the ingest path, shared with observers.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    events_ingested: AtomicU64,
    records_malformed: AtomicU64,
    source_errors_reported: AtomicU64,
}

impl IngestMetrics {
    pub fn events_ingested(&self) -> u64 {
        self.events_ingested.load(Ordering::Relaxed)
    }

    pub fn records_malformed(&self) -> u64 {
        self.records_malformed.load(Ordering::Relaxed)
    }

    /// Number of per-partition failure reports actually emitted. Stays at
    /// one per failure streak no matter how many ticks the streak spans.
    pub fn source_errors_reported(&self) -> u64 {
        self.source_errors_reported.load(Ordering::Relaxed)
    }
}

struct PartitionSlot {
    partition: PartitionId,
    cursor: Option<Cursor>,
    /// Failure already reported for the current streak.
    degraded: bool,
}

/// Polls source partitions and feeds the sliding window store.
pub struct IngestAdapter {
    source: Arc<dyn ReviewSource>,
    window: Arc<SlidingWindowStore>,
    config: StreamConfig,
    position: StartPosition,
    slots: Vec<PartitionSlot>,
    metrics: Arc<IngestMetrics>,
}

impl IngestAdapter {
    /// Connect to the source and open one cursor per partition.
    ///
    /// An undescribable or partition-less source is the one fatal ingest
    /// condition; individual cursors that fail to open are reported once
    /// and retried on subsequent ticks.
    pub async fn connect(
        source: Arc<dyn ReviewSource>,
        window: Arc<SlidingWindowStore>,
        config: StreamConfig,
        position: StartPosition,
    ) -> Result<Self, IngestError> {
        let partitions =
            source
                .describe_partitions()
                .await
                .map_err(|e| IngestError::ConnectFailed {
                    reason: e.to_string(),
                })?;
        if partitions.is_empty() {
            return Err(IngestError::ConnectFailed {
                reason: "source exposes no partitions".to_string(),
            });
        }

        let metrics = Arc::new(IngestMetrics::default());
        let mut slots = Vec::with_capacity(partitions.len());
        for partition in partitions {
            match source.open_cursor(&partition, position).await {
                Ok(cursor) => slots.push(PartitionSlot {
                    partition,
                    cursor: Some(cursor),
                    degraded: false,
                }),
                Err(e) => {
                    error!(
                        "{}",
                        IngestError::source_unavailable(partition.as_str(), &e)
                    );
                    metrics.source_errors_reported.fetch_add(1, Ordering::Relaxed);
                    slots.push(PartitionSlot {
                        partition,
                        cursor: None,
                        degraded: true,
                    });
                }
            }
        }

        info!(
            "Ingest adapter connected: {} partition(s), poll interval {:?}",
            slots.len(),
            config.poll_interval
        );
        Ok(Self {
            source,
            window,
            config,
            position,
            slots,
            metrics,
        })
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the poll loop until the stop signal flips.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_tick().await;
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!(
            "Ingest adapter stopped: {} event(s) ingested, {} malformed record(s) dropped",
            self.metrics.events_ingested(),
            self.metrics.records_malformed()
        );
    }

    /// One round-robin sweep over all partitions. Public so tests and
    /// embedders can drive ingestion deterministically.
    pub async fn poll_tick(&mut self) {
        for idx in 0..self.slots.len() {
            self.poll_partition(idx).await;
        }
    }

    async fn poll_partition(&mut self, idx: usize) {
        // Reopen a missing cursor before fetching; both paths share the
        // once-per-streak reporting rule.
        if self.slots[idx].cursor.is_none() {
            let partition = self.slots[idx].partition.clone();
            match self.source.open_cursor(&partition, self.position).await {
                Ok(cursor) => {
                    if self.slots[idx].degraded {
                        info!("Partition '{}' recovered", partition);
                    }
                    self.slots[idx].cursor = Some(cursor);
                    self.slots[idx].degraded = false;
                }
                Err(e) => {
                    self.report_once(idx, &e.to_string());
                    return;
                }
            }
        }

        let Some(cursor) = self.slots[idx].cursor.clone() else {
            return;
        };
        let fetch = timeout(
            self.config.fetch_timeout,
            self.source.fetch(&cursor, self.config.fetch_limit),
        )
        .await;

        let batch = match fetch {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                self.report_once(idx, &e.to_string());
                return;
            }
            Err(_) => {
                self.report_once(idx, "fetch timed out");
                return;
            }
        };

        if self.slots[idx].degraded {
            info!("Partition '{}' recovered", self.slots[idx].partition);
            self.slots[idx].degraded = false;
        }

        let now = Utc::now();
        for record in &batch.records {
            match serde_json::from_slice::<RawReview>(&record.data) {
                Ok(review) => {
                    let tokens = TokenizerProfile::Permissive.tokenize(&review.text);
                    let sentiment = Sentiment::parse(&review.sentiment);
                    self.window.append(Event::new(now, tokens, sentiment));
                    self.metrics.events_ingested.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.metrics.records_malformed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        "{}",
                        IngestError::malformed_record(self.slots[idx].partition.as_str(), e)
                    );
                }
            }
        }
        self.slots[idx].cursor = batch.next_cursor;
    }

    fn report_once(&mut self, idx: usize, reason: &str) {
        if !self.slots[idx].degraded {
            warn!(
                "{}",
                IngestError::source_unavailable(self.slots[idx].partition.as_str(), reason)
            );
            self.slots[idx].degraded = true;
            self.metrics.source_errors_reported.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviewstream::datasource::memory::{InMemorySource, review_record};
    use crate::reviewstream::datasource::types::RawRecord;
    use std::time::Duration;

    fn test_config() -> StreamConfig {
        StreamConfig::new()
            .with_retention_horizon(Duration::from_secs(180))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_ingests_and_tokenizes_records() {
        let source = Arc::new(InMemorySource::new().with_partition(
            "shard-0001",
            vec![
                review_record("Great Book!", "positive"),
                review_record("terrible", ""),
            ],
        ));
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let mut adapter = IngestAdapter::connect(
            source,
            Arc::clone(&window),
            test_config(),
            StartPosition::Earliest,
        )
        .await
        .unwrap();

        adapter.poll_tick().await;

        let events = window.snapshot_view(Utc::now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tokens, vec!["great", "book!"]);
        assert_eq!(events[0].sentiment, Sentiment::Positive);
        // Blank sentiment maps to Unknown and is still ingested.
        assert_eq!(events[1].sentiment, Sentiment::Unknown);
        assert_eq!(adapter.metrics().events_ingested(), 2);
    }

    #[tokio::test]
    async fn test_malformed_records_are_dropped_not_fatal() {
        let source = Arc::new(InMemorySource::new().with_partition(
            "shard-0001",
            vec![
                RawRecord::new(&b"not json"[..]),
                review_record("fine", "neutral"),
            ],
        ));
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let mut adapter = IngestAdapter::connect(
            source,
            Arc::clone(&window),
            test_config(),
            StartPosition::Earliest,
        )
        .await
        .unwrap();

        adapter.poll_tick().await;

        assert_eq!(window.len(), 1);
        let metrics = adapter.metrics();
        assert_eq!(metrics.records_malformed(), 1);
        // A malformed record is not a source failure.
        assert_eq!(metrics.source_errors_reported(), 0);
    }

    #[tokio::test]
    async fn test_failing_partition_does_not_block_siblings() {
        let source = Arc::new(
            InMemorySource::new()
                .with_failing_partition("shard-0001")
                .with_partition("shard-0002", vec![review_record("healthy", "positive")]),
        );
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let mut adapter = IngestAdapter::connect(
            source,
            Arc::clone(&window),
            test_config(),
            StartPosition::Earliest,
        )
        .await
        .unwrap();

        for _ in 0..5 {
            adapter.poll_tick().await;
        }

        // The healthy partition's record arrived despite the broken sibling.
        assert_eq!(adapter.metrics().events_ingested(), 1);
        // Five failing ticks, one report: errors are deduplicated per streak.
        assert_eq!(adapter.metrics().source_errors_reported(), 1);
    }

    #[tokio::test]
    async fn test_recovered_partition_reports_again_on_next_streak() {
        let source = Arc::new(InMemorySource::new().with_failing_partition("shard-0001"));
        let partition = PartitionId::from("shard-0001");
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let mut adapter = IngestAdapter::connect(
            Arc::clone(&source) as Arc<dyn ReviewSource>,
            Arc::clone(&window),
            test_config(),
            StartPosition::Earliest,
        )
        .await
        .unwrap();
        assert_eq!(adapter.metrics().source_errors_reported(), 1);

        source.heal_partition(&partition);
        source.push(&partition, review_record("back", "neutral"));
        adapter.poll_tick().await;
        assert_eq!(adapter.metrics().events_ingested(), 1);

        // A fresh failure after recovery is a new streak: exactly one more
        // report across repeated ticks.
        source.fail_partition(&partition);
        for _ in 0..3 {
            adapter.poll_tick().await;
        }
        assert_eq!(adapter.metrics().source_errors_reported(), 2);
    }

    #[tokio::test]
    async fn test_connect_fails_on_empty_source() {
        let source = Arc::new(InMemorySource::new());
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let result = IngestAdapter::connect(
            source,
            window,
            test_config(),
            StartPosition::Earliest,
        )
        .await;
        assert!(matches!(result, Err(IngestError::ConnectFailed { .. })));
    }
}

//! Batch partition runner
//!
//! Re-runs the same counting/merging core as the streaming path over a
//! static dataset at increasing load fractions. Each fraction takes the
//! prefix subset, splits it into roughly-equal partitions, aggregates each
//! partition independently (on blocking worker threads in parallel mode),
//! and merges the results. Parallel runs merge in approximate mode
//! (partition-local top-K truncation before the global merge); the
//! sequential baseline has a single authoritative counter and reduces in
//! exact mode. Both produce the same [`BatchReport`] schema so they can be
//! compared directly.

use crate::reviewstream::aggregate::FrequencyCounter;
use crate::reviewstream::config::BatchConfig;
use crate::reviewstream::error::ConfigError;
use crate::reviewstream::model::{
    BatchReport, BatchTask, ExecutionMode, RawReview, Sentiment,
};
use crate::reviewstream::tokenizer::TokenizerProfile;
use crate::reviewstream::topn::{RankedWords, top_n_approximate, top_n_exact};
use log::{error, info, warn};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

/// Floor for per-record latency, avoiding division artifacts on tiny or
/// empty subsets.
pub const LATENCY_EPSILON_SECS: f64 = 1e-6;

/// One parsed dataset row.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub text: String,
    pub sentiment: Sentiment,
}

/// Static dataset for batch runs.
#[derive(Debug, Default)]
pub struct BatchDataset {
    records: Vec<ReviewRecord>,
    skipped: usize,
}

impl BatchDataset {
    pub fn from_records(records: Vec<ReviewRecord>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }

    /// Parse a JSON-lines dataset (`{"text", "sentiment"}` per line, the
    /// same payload schema the stream producer uses). Malformed lines are
    /// skipped and counted, never fatal.
    pub fn from_json_lines(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawReview>(line) {
                Ok(review) => records.push(ReviewRecord {
                    text: review.text,
                    sentiment: Sentiment::parse(&review.sentiment),
                }),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Dataset contained {} malformed line(s), skipped", skipped);
        }
        Self { records, skipped }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lines skipped during parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Runs a counting task over load-fraction subsets of a dataset.
pub struct BatchPartitionRunner {
    config: BatchConfig,
}

impl BatchPartitionRunner {
    pub fn new(config: BatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run `task` at every configured load fraction, returning one report
    /// per fraction in configuration order.
    pub async fn run(
        &self,
        dataset: &Arc<BatchDataset>,
        task: BatchTask,
        mode: ExecutionMode,
    ) -> Vec<BatchReport> {
        let mut reports = Vec::with_capacity(self.config.load_fractions.len());
        for &fraction in &self.config.load_fractions {
            let report = self.run_fraction(dataset, task, mode, fraction).await;
            info!(
                "Batch {} {} {}%: {} records in {:.4}s ({:.2} records/s)",
                mode,
                task,
                fraction,
                report.record_count,
                report.elapsed_secs,
                report.throughput_rps
            );
            reports.push(report);
        }
        reports
    }

    async fn run_fraction(
        &self,
        dataset: &Arc<BatchDataset>,
        task: BatchTask,
        mode: ExecutionMode,
        fraction: u8,
    ) -> BatchReport {
        let subset_len = dataset.len() * fraction as usize / 100;
        let partitions = match mode {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Parallel => self.config.partition_count,
        };

        let start = Instant::now();
        let counters = self
            .aggregate_partitions(dataset, task, subset_len, partitions)
            .await;
        let top_words = match mode {
            // A single authoritative counter: exact reduction.
            ExecutionMode::Sequential => self.reduce_exact(&counters),
            // Partition-local pre-filtering: approximate merge.
            ExecutionMode::Parallel => {
                top_n_approximate(&counters, self.config.top_n, self.config.local_top_k)
            }
        };
        let elapsed = start.elapsed().as_secs_f64();

        let throughput_rps = if elapsed > 0.0 {
            subset_len as f64 / elapsed
        } else {
            0.0
        };
        let latency_per_record = if subset_len > 0 {
            (elapsed / subset_len as f64).max(LATENCY_EPSILON_SECS)
        } else {
            LATENCY_EPSILON_SECS
        };

        BatchReport {
            mode,
            task,
            load_fraction: fraction,
            record_count: subset_len,
            elapsed_secs: elapsed,
            throughput_rps,
            latency_per_record,
            top_words,
        }
    }

    fn reduce_exact(&self, counters: &[FrequencyCounter]) -> RankedWords {
        let mut merged = FrequencyCounter::new();
        for counter in counters {
            merged.merge(counter);
        }
        top_n_exact(&merged, self.config.top_n)
    }

    async fn aggregate_partitions(
        &self,
        dataset: &Arc<BatchDataset>,
        task: BatchTask,
        subset_len: usize,
        partitions: usize,
    ) -> Vec<FrequencyCounter> {
        let tokenizer = self.config.tokenizer;
        if partitions <= 1 {
            return vec![aggregate_range(dataset, 0..subset_len, task, tokenizer)];
        }

        let chunk = subset_len.div_ceil(partitions);
        let mut handles = Vec::new();
        for p in 0..partitions {
            let start = p * chunk;
            if start >= subset_len {
                break;
            }
            let end = ((p + 1) * chunk).min(subset_len);
            let data = Arc::clone(dataset);
            handles.push(tokio::task::spawn_blocking(move || {
                aggregate_range(&data, start..end, task, tokenizer)
            }));
        }

        let mut counters = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(counter) => counters.push(counter),
                // A worker panic loses that partition's counts but never
                // the whole run.
                Err(e) => error!("Batch worker failed: {}", e),
            }
        }
        counters
    }
}

/// Pure fold over one partition of the dataset. No shared mutable state;
/// safe to dispatch across workers.
fn aggregate_range(
    dataset: &BatchDataset,
    range: Range<usize>,
    task: BatchTask,
    tokenizer: TokenizerProfile,
) -> FrequencyCounter {
    let mut counter = FrequencyCounter::new();
    for record in &dataset.records[range] {
        match task {
            BatchTask::WordCount => {
                for token in tokenizer.tokenize(&record.text) {
                    counter.increment(&token);
                }
            }
            // Uniform sentiment policy: unknown labels are counted too.
            BatchTask::Sentiment => counter.increment(record.sentiment.as_str()),
        }
    }
    counter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_of(n: usize) -> Arc<BatchDataset> {
        let records = (0..n)
            .map(|i| ReviewRecord {
                text: format!("common word{}", i % 7),
                sentiment: if i % 2 == 0 {
                    Sentiment::Positive
                } else {
                    Sentiment::Negative
                },
            })
            .collect();
        Arc::new(BatchDataset::from_records(records))
    }

    #[tokio::test]
    async fn test_load_fractions_take_prefix_floor() {
        let dataset = dataset_of(1000);
        let runner = BatchPartitionRunner::new(BatchConfig::new().with_partition_count(4))
            .unwrap();
        let reports = runner
            .run(&dataset, BatchTask::WordCount, ExecutionMode::Parallel)
            .await;

        assert_eq!(reports.len(), 4);
        for (report, pct) in reports.iter().zip([25usize, 50, 75, 100]) {
            assert_eq!(report.record_count, 1000 * pct / 100);
        }
        // Monotonically non-decreasing record counts.
        for pair in reports.windows(2) {
            assert!(pair[0].record_count <= pair[1].record_count);
        }
    }

    #[tokio::test]
    async fn test_fraction_floor_on_awkward_sizes() {
        let dataset = dataset_of(7);
        let runner = BatchPartitionRunner::new(
            BatchConfig::new()
                .with_load_fractions(vec![25, 50])
                .with_partition_count(2),
        )
        .unwrap();
        let reports = runner
            .run(&dataset, BatchTask::WordCount, ExecutionMode::Sequential)
            .await;
        assert_eq!(reports[0].record_count, 1); // floor(7 * 25 / 100)
        assert_eq!(reports[1].record_count, 3); // floor(7 * 50 / 100)
    }

    #[tokio::test]
    async fn test_sequential_and_parallel_agree_on_counts() {
        let dataset = dataset_of(200);
        let config = BatchConfig::new()
            .with_partition_count(4)
            .with_load_fractions(vec![100])
            // Large enough K that truncation discards nothing here.
            .with_local_top_k(1000);
        let runner = BatchPartitionRunner::new(config).unwrap();

        let sequential = runner
            .run(&dataset, BatchTask::WordCount, ExecutionMode::Sequential)
            .await;
        let parallel = runner
            .run(&dataset, BatchTask::WordCount, ExecutionMode::Parallel)
            .await;

        // "common" appears in every record; both modes must count it fully.
        let seq_common = sequential[0]
            .top_words
            .iter()
            .find(|(w, _)| w == "common")
            .map(|(_, c)| *c);
        let par_common = parallel[0]
            .top_words
            .iter()
            .find(|(w, _)| w == "common")
            .map(|(_, c)| *c);
        assert_eq!(seq_common, Some(200));
        assert_eq!(par_common, Some(200));
        assert_eq!(sequential[0].mode, ExecutionMode::Sequential);
        assert_eq!(parallel[0].mode, ExecutionMode::Parallel);
    }

    #[tokio::test]
    async fn test_sentiment_task_counts_labels() {
        let dataset = dataset_of(10);
        let runner = BatchPartitionRunner::new(
            BatchConfig::new()
                .with_load_fractions(vec![100])
                .with_partition_count(2),
        )
        .unwrap();
        let reports = runner
            .run(&dataset, BatchTask::Sentiment, ExecutionMode::Parallel)
            .await;
        let words = &reports[0].top_words;
        assert!(words.contains(&("positive".to_string(), 5)));
        assert!(words.contains(&("negative".to_string(), 5)));
    }

    #[tokio::test]
    async fn test_empty_dataset_produces_epsilon_latency() {
        let dataset = Arc::new(BatchDataset::from_records(vec![]));
        let runner = BatchPartitionRunner::new(
            BatchConfig::new().with_load_fractions(vec![100]),
        )
        .unwrap();
        let reports = runner
            .run(&dataset, BatchTask::WordCount, ExecutionMode::Sequential)
            .await;
        assert_eq!(reports[0].record_count, 0);
        assert_eq!(reports[0].latency_per_record, LATENCY_EPSILON_SECS);
        assert!(reports[0].top_words.is_empty());
    }

    #[test]
    fn test_json_lines_parsing_skips_malformed() {
        let data = br#"{"text":"good","sentiment":"positive"}
not json at all
{"text":"bad","sentiment":"negative"}

{"text":"meh"}"#;
        let dataset = BatchDataset::from_json_lines(data);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.skipped(), 1);
        assert_eq!(dataset.records[2].sentiment, Sentiment::Unknown);
    }
}

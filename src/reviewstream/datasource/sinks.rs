//! Built-in sink implementations
//!
//! The reference system had two presentation variants (interactive plot
//! and dashboard) that each re-encoded the engine. Here the engine is
//! single and the variants are sinks: `LogSink` renders a textual
//! dashboard through the logger, `JsonLinesSink` appends one JSON document
//! per emission to a file for downstream tooling.

use crate::reviewstream::datasource::traits::SnapshotSink;
use crate::reviewstream::error::BoxedError;
use crate::reviewstream::model::{BatchReport, Sentiment, WindowSnapshot};
use async_trait::async_trait;
use log::info;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Renders snapshots and reports as log lines.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        LogSink
    }
}

#[async_trait]
impl SnapshotSink for LogSink {
    async fn emit_snapshot(&self, snapshot: &WindowSnapshot) -> Result<(), BoxedError> {
        let words: Vec<String> = snapshot
            .top_words
            .iter()
            .map(|(word, count)| format!("{}:{}", word, count))
            .collect();
        let sentiments: Vec<String> = Sentiment::ALL
            .iter()
            .filter_map(|label| {
                snapshot
                    .sentiment_distribution
                    .get(label)
                    .filter(|count| **count > 0)
                    .map(|count| format!("{}={}", label, count))
            })
            .collect();
        info!(
            "Window snapshot @ {} | {} events | top words: [{}] | sentiment: [{}]",
            snapshot.as_of.format("%H:%M:%S"),
            snapshot.window_len,
            words.join(", "),
            sentiments.join(", ")
        );
        Ok(())
    }

    async fn emit_report(&self, report: &BatchReport) -> Result<(), BoxedError> {
        info!(
            "Batch {} {} {}%: {} records in {:.4}s | {:.2} records/s | {:.6}s/record",
            report.mode,
            report.task,
            report.load_fraction,
            report.record_count,
            report.elapsed_secs,
            report.throughput_rps,
            report.latency_per_record
        );
        Ok(())
    }
}

/// Appends one JSON document per emission to a file.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn append_line(&self, line: String) -> Result<(), BoxedError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| format!("open '{}': {}", self.path.display(), e))?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for JsonLinesSink {
    async fn emit_snapshot(&self, snapshot: &WindowSnapshot) -> Result<(), BoxedError> {
        self.append_line(serde_json::to_string(snapshot)?).await
    }

    async fn emit_report(&self, report: &BatchReport) -> Result<(), BoxedError> {
        self.append_line(serde_json::to_string(report)?).await
    }
}

//! Core data model for the review analytics engine
//!
//! These types are shared by the streaming window path and the batch
//! partition runner. Everything here is immutable after construction:
//! events are created once at ingest time and snapshots/reports are
//! built fresh on every emission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentiment label attached to a review record.
///
/// Blank or unrecognized labels map to `Unknown`; that mapping is the
/// single sentiment policy for both the streaming and batch paths.
/// `Unknown` events are counted in distributions, and sinks may choose
/// to hide the `unknown` slice at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Sentiment {
    /// All labels in display order.
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Negative,
        Sentiment::Unknown,
    ];

    /// Parse a raw label, case-insensitively. Anything that is not a
    /// known label (including the empty string) becomes `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "neutral" => Sentiment::Neutral,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire payload produced by the review producer and staged batch datasets.
///
/// Both the streaming sources and the JSON-lines batch datasets carry this
/// schema, so one serde model covers both ingest paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sentiment: String,
}

/// One ingested record inside the sliding window.
///
/// The timestamp is the UTC arrival time assigned by the ingest adapter,
/// never the producer-side time, and is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub tokens: Vec<String>,
    pub sentiment: Sentiment,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, tokens: Vec<String>, sentiment: Sentiment) -> Self {
        Self {
            timestamp,
            tokens,
            sentiment,
        }
    }
}

/// Immutable output of one scheduler tick over the sliding window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowSnapshot {
    /// Time the snapshot was taken (eviction cutoff reference).
    pub as_of: DateTime<Utc>,
    /// Highest-frequency words in the window, descending, length <= top_n.
    pub top_words: Vec<(String, u64)>,
    /// Event count per sentiment label within the window.
    pub sentiment_distribution: HashMap<Sentiment, u64>,
    /// Number of events the snapshot was computed over.
    pub window_len: usize,
}

/// Which counting task a batch run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchTask {
    /// Word frequencies over review text (alnum-only tokenization).
    WordCount,
    /// Sentiment label frequencies.
    Sentiment,
}

impl BatchTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchTask::WordCount => "wordcount",
            BatchTask::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for BatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a batch run dispatched partitions to parallel workers or
/// folded the whole subset on the calling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable result of one (load fraction, task) batch run.
///
/// Sequential and parallel runs produce the same schema so the two can be
/// compared directly in exported artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub mode: ExecutionMode,
    pub task: BatchTask,
    /// Dataset percentage this run covered (e.g. 25, 50, 75, 100).
    pub load_fraction: u8,
    /// Records in the prefix subset: floor(total * fraction / 100).
    pub record_count: usize,
    /// Wall-clock time for the aggregation pass, in seconds.
    pub elapsed_secs: f64,
    /// Records per second over the run.
    pub throughput_rps: f64,
    /// Seconds per record, floored at a minimum epsilon.
    pub latency_per_record: f64,
    /// Ranked (key, count) pairs: words for word-count runs, sentiment
    /// labels for sentiment runs.
    pub top_words: Vec<(String, u64)>,
}

//! # reviewstream
//!
//! A streaming and batch analytics engine for sentiment-tagged review
//! streams: a continuously-refreshed sliding-window summary (top-N words,
//! sentiment distribution) over the last W seconds of traffic, and a
//! partitioned batch runner that replays the same counting/merging core
//! over static datasets at increasing load fractions.
//!
//! ## Features
//!
//! - **Sliding window engine**: time-bounded event buffer with monotonic
//!   head eviction, safe under one concurrent writer and one
//!   reader/evictor
//! - **Commutative counters**: order-independent word/sentiment folds,
//!   mergeable across arbitrary partition shapes
//! - **Exact and approximate top-N**: deterministic first-seen tie-breaks
//!   in exact mode; tunable partition-local top-K truncation in
//!   approximate merge mode
//! - **Abstract edges**: sources, sinks, and storage behind async traits,
//!   with in-memory and file-backed implementations included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reviewstream::{
//!     CollectingSink, InMemorySource, StartPosition, StreamConfig, StreamPipeline,
//!     review_record,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(InMemorySource::new().with_partition(
//!         "shard-0001",
//!         vec![review_record("loved this book", "positive")],
//!     ));
//!     let sink = Arc::new(CollectingSink::new());
//!
//!     let pipeline = StreamPipeline::spawn(
//!         source,
//!         Arc::clone(&sink) as _,
//!         StreamConfig::default(),
//!         StartPosition::Earliest,
//!     )
//!     .await?;
//!
//!     // ... let it run, then drain gracefully
//!     let stats = pipeline.shutdown().await;
//!     println!("emitted {} snapshot(s)", stats.snapshots_emitted);
//!     Ok(())
//! }
//! ```

pub mod reviewstream;

// Re-export the main API at the crate root for easy access
pub use reviewstream::aggregate::{FrequencyCounter, SentimentCounts, aggregate};
pub use reviewstream::batch::{BatchDataset, BatchPartitionRunner, ReviewRecord};
pub use reviewstream::config::{BatchConfig, StreamConfig};
pub use reviewstream::datasource::{
    CollectingSink, Cursor, FetchBatch, InMemorySource, InMemoryStorage, JsonLinesSink,
    LocalFileStorage, LogSink, PartitionId, RawRecord, ReviewSource, SnapshotSink, StartPosition,
    StorageGateway, review_record,
};
pub use reviewstream::error::{ConfigError, IngestError, StorageUnavailable, WindowOverflow};
pub use reviewstream::export::{export_reports, reports_to_csv, METRICS_CSV_HEADER};
pub use reviewstream::ingest::IngestAdapter;
pub use reviewstream::model::{
    BatchReport, BatchTask, Event, ExecutionMode, RawReview, Sentiment, WindowSnapshot,
};
pub use reviewstream::pipeline::StreamPipeline;
pub use reviewstream::scheduler::SnapshotScheduler;
pub use reviewstream::tokenizer::TokenizerProfile;
pub use reviewstream::topn::{top_n_approximate, top_n_exact};
pub use reviewstream::window::SlidingWindowStore;

//! Streaming analytics demo binary
//!
//! Runs the full streaming path against an in-memory sharded source fed
//! by a synthetic review producer: ingest -> sliding window -> snapshot
//! scheduler -> sink. The sink is either the textual log dashboard or a
//! JSON-lines file; both present the same engine output.

use clap::Parser;
use log::info;
use rand::Rng;
use rand::seq::IndexedRandom;
use reviewstream::reviewstream::shutdown::shutdown_signal;
use reviewstream::{
    InMemorySource, JsonLinesSink, LogSink, PartitionId, SnapshotSink, StartPosition,
    StreamConfig, StreamPipeline, review_record,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "review-stream")]
#[command(about = "Sliding-window word/sentiment analytics over a review stream")]
#[command(version)]
struct Cli {
    /// Number of source partitions (shards) to simulate
    #[arg(long, default_value = "2")]
    shards: usize,

    /// Window retention horizon in seconds
    #[arg(long, default_value = "180")]
    retention_secs: u64,

    /// Snapshot refresh interval in seconds
    #[arg(long, default_value = "5")]
    refresh_secs: u64,

    /// Number of top words per snapshot
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Synthetic reviews produced per second across all shards
    #[arg(long, default_value = "20")]
    rate: u64,

    /// Write snapshots as JSON lines to this file instead of the log dashboard
    #[arg(long)]
    jsonl: Option<String>,
}

const SAMPLE_PHRASES: &[(&str, &str)] = &[
    ("loved this book absolutely wonderful", "positive"),
    ("great story and characters", "positive"),
    ("the plot was fine nothing special", "neutral"),
    ("average read finished it anyway", "neutral"),
    ("terrible pacing could not finish", "negative"),
    ("waste of money very disappointed", "negative"),
    ("book arrived damaged", ""),
];

/// Interval between synthetic records. Clamped to 1ms because
/// `tokio::time::interval` panics on a zero period.
fn producer_delay(rate: u64) -> Duration {
    Duration::from_millis((1000 / rate.max(1)).max(1))
}

fn spawn_producer(source: Arc<InMemorySource>, shards: Vec<PartitionId>, rate: u64) {
    tokio::spawn(async move {
        let delay = producer_delay(rate);
        let mut ticker = tokio::time::interval(delay);
        loop {
            ticker.tick().await;
            let mut rng = rand::rng();
            let (text, sentiment) = SAMPLE_PHRASES
                .choose(&mut rng)
                .copied()
                .unwrap_or(("placeholder", "neutral"));
            let shard = rng.random_range(0..shards.len());
            source.push(&shards[shard], review_record(text, sentiment));
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut source = InMemorySource::new();
    let mut shards = Vec::with_capacity(cli.shards);
    for i in 0..cli.shards.max(1) {
        let name = format!("shard-{:04}", i);
        shards.push(PartitionId::new(name.clone()));
        source = source.with_partition(name, vec![]);
    }
    let source = Arc::new(source);

    let sink: Arc<dyn SnapshotSink> = match &cli.jsonl {
        Some(path) => Arc::new(JsonLinesSink::new(path)),
        None => Arc::new(LogSink::new()),
    };

    let config = StreamConfig::new()
        .with_retention_horizon(Duration::from_secs(cli.retention_secs))
        .with_refresh_interval(Duration::from_secs(cli.refresh_secs))
        .with_top_n(cli.top_n);

    let pipeline = StreamPipeline::spawn(
        Arc::clone(&source) as _,
        sink,
        config,
        StartPosition::Latest,
    )
    .await?;
    spawn_producer(Arc::clone(&source), shards, cli.rate);
    info!(
        "Streaming {} synthetic reviews/s across {} shard(s); Ctrl+C to stop",
        cli.rate, cli.shards
    );

    let signal = shutdown_signal().await;
    info!("Draining pipeline after {}", signal);
    let stats = pipeline.shutdown().await;
    info!(
        "Done: {} snapshot(s) emitted over {} tick(s)",
        stats.snapshots_emitted, stats.ticks
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_delay_never_zero() {
        assert_eq!(producer_delay(0), Duration::from_millis(1000));
        assert_eq!(producer_delay(20), Duration::from_millis(50));
        assert_eq!(producer_delay(1000), Duration::from_millis(1));
        // Rates above 1000/s would compute a zero period; clamp to 1ms.
        assert_eq!(producer_delay(5000), Duration::from_millis(1));
        assert_eq!(producer_delay(u64::MAX), Duration::from_millis(1));
    }
}

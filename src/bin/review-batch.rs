//! Batch analytics runner binary
//!
//! Stages a JSON-lines review dataset through the storage gateway, runs
//! the wordcount and sentiment tasks at each load fraction in both
//! sequential and parallel modes, emits every report to the log sink, and
//! exports CSV/JSON metric artifacts back through the gateway.

use clap::Parser;
use log::{info, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use reviewstream::reviewstream::datasource::{get_with_retry, put_with_retry};
use reviewstream::reviewstream::export::export_reports;
use reviewstream::{
    BatchConfig, BatchDataset, BatchPartitionRunner, BatchReport, BatchTask, ExecutionMode,
    LocalFileStorage, LogSink, SnapshotSink, review_record,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "review-batch")]
#[command(about = "Partitioned batch word/sentiment analytics over a static review dataset")]
#[command(version)]
struct Cli {
    /// Root directory for the storage gateway (datasets and artifacts)
    #[arg(long, default_value = "./review-batch-data")]
    data_root: String,

    /// Storage key of the JSON-lines dataset to analyze
    #[arg(long, default_value = "datasets/reviews.jsonl")]
    dataset_key: String,

    /// Generate a synthetic dataset of this many records under the
    /// dataset key before running (skipped if 0)
    #[arg(long, default_value = "0")]
    generate: usize,

    /// Number of partitions (parallel workers)
    #[arg(long)]
    partitions: Option<usize>,

    /// Number of top words per report
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Partition-local top-K bound for the approximate merge
    #[arg(long, default_value = "100")]
    local_top_k: usize,

    /// Comma-separated load fractions (percentages)
    #[arg(long, default_value = "25,50,75,100")]
    load_fractions: String,

    /// Run only the sequential baseline
    #[arg(long)]
    sequential_only: bool,
}

const SAMPLE_PHRASES: &[(&str, &str)] = &[
    ("a truly great book", "positive"),
    ("wonderful read highly recommend", "positive"),
    ("it was okay", "neutral"),
    ("nothing remarkable here", "neutral"),
    ("dull and overlong", "negative"),
    ("regret buying this", "negative"),
];

async fn generate_dataset(
    storage: &LocalFileStorage,
    key: &str,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines = {
        let mut rng = rand::rng();
        let mut lines = String::new();
        for _ in 0..count {
            let (text, sentiment) = SAMPLE_PHRASES
                .choose(&mut rng)
                .copied()
                .unwrap_or(("placeholder", "neutral"));
            let suffix = rng.random_range(0..1000u32);
            let record = review_record(&format!("{} {}", text, suffix), sentiment);
            lines.push_str(&String::from_utf8_lossy(&record.data));
            lines.push('\n');
        }
        lines
    };
    put_with_retry(storage, key, lines.as_bytes()).await?;
    info!("Generated {} synthetic record(s) under '{}'", count, key);
    Ok(())
}

fn parse_fractions(raw: &str) -> Vec<u8> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let storage = LocalFileStorage::new(&cli.data_root);
    if cli.generate > 0 {
        generate_dataset(&storage, &cli.dataset_key, cli.generate).await?;
    }

    let bytes = get_with_retry(&storage, &cli.dataset_key).await?;
    let dataset = Arc::new(BatchDataset::from_json_lines(&bytes));
    if dataset.is_empty() {
        warn!("Dataset '{}' is empty, nothing to do", cli.dataset_key);
        return Ok(());
    }
    info!(
        "Loaded {} record(s) from '{}'",
        dataset.len(),
        cli.dataset_key
    );

    let mut config = BatchConfig::new()
        .with_top_n(cli.top_n)
        .with_local_top_k(cli.local_top_k)
        .with_load_fractions(parse_fractions(&cli.load_fractions));
    if let Some(partitions) = cli.partitions {
        config = config.with_partition_count(partitions);
    }
    let runner = BatchPartitionRunner::new(config)?;

    let modes: &[ExecutionMode] = if cli.sequential_only {
        &[ExecutionMode::Sequential]
    } else {
        &[ExecutionMode::Sequential, ExecutionMode::Parallel]
    };

    let sink = LogSink::new();
    let mut all_reports: Vec<BatchReport> = Vec::new();
    for &mode in modes {
        for task in [BatchTask::WordCount, BatchTask::Sentiment] {
            let reports = runner.run(&dataset, task, mode).await;
            for report in &reports {
                if let Err(e) = sink.emit_report(report).await {
                    warn!("Sink rejected report: {}", e);
                }
            }
            all_reports.extend(reports);
        }
    }

    export_reports(&storage, "results", &all_reports).await;
    info!("Batch run complete: {} report(s)", all_reports.len());
    Ok(())
}

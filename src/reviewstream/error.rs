//! Error taxonomy for the analytics pipeline
//!
//! Nothing in the aggregation path is allowed to terminate the process:
//! source failures are retried on the next poll tick, malformed records are
//! dropped, window overflow and storage failures are surfaced as warnings.
//! Only configuration errors at startup are fatal.

use std::error::Error;

/// Boxed error type used at the source/sink/storage trait seams.
pub type BoxedError = Box<dyn Error + Send + Sync>;

/// Errors raised on the ingest path.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A partition's cursor could not be obtained, renewed, or fetched
    /// from. Retried on the next poll tick; reported once per failure
    /// streak rather than once per tick.
    #[error("Source partition '{partition}' unavailable: {reason}")]
    SourceUnavailable { partition: String, reason: String },

    /// A record failed to parse. The record is dropped and ingestion
    /// continues; this does not count as a source failure.
    #[error("Malformed record on partition '{partition}': {reason}")]
    MalformedRecord { partition: String, reason: String },

    /// The source had no partitions or could not be described at startup.
    /// This is the one fatal ingest condition, raised at initial connect.
    #[error("Failed to connect to review source: {reason}")]
    ConnectFailed { reason: String },
}

impl IngestError {
    pub fn source_unavailable(partition: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::SourceUnavailable {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_record(partition: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::MalformedRecord {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }
}

/// Eviction fell behind the retention policy beyond the safety cap and the
/// oldest entries were forcibly dropped. A warning, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("Window overflow: dropped {dropped} oldest event(s), capacity {cap}")]
pub struct WindowOverflow {
    pub dropped: usize,
    pub cap: usize,
}

/// Storage gateway operation failed after exhausting its retry budget.
/// The dependent artifact is skipped; the run continues.
#[derive(Debug, thiserror::Error)]
#[error("Storage operation for '{key}' failed after {attempts} attempt(s): {source}")]
pub struct StorageUnavailable {
    pub key: String,
    pub attempts: u32,
    #[source]
    pub source: BoxedError,
}

/// Invalid configuration detected at startup. The only fatal error class.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("top_n must be greater than zero")]
    ZeroTopN,

    #[error("local_top_k must be greater than zero")]
    ZeroLocalTopK,

    #[error("partition_count must be greater than zero")]
    ZeroPartitions,

    #[error("load_fractions must be non-empty")]
    EmptyLoadFractions,

    #[error("load fraction {0} is out of range (1..=100)")]
    FractionOutOfRange(u8),

    #[error("retention_horizon must be greater than zero")]
    ZeroRetention,

    #[error("refresh_interval must be greater than zero")]
    ZeroRefreshInterval,
}

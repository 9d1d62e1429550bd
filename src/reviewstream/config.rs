//! Pipeline configuration
//!
//! Defaults match the reference deployment: a 180 second retention
//! horizon refreshed every 5 seconds for the streaming window, and
//! 25/50/75/100% load fractions for batch runs. Every knob has a
//! builder-style setter, and the operational knobs can also be overridden
//! via `REVIEWSTREAM_*` environment variables.

use crate::reviewstream::error::ConfigError;
use crate::reviewstream::tokenizer::TokenizerProfile;
use std::time::Duration;

/// Built-in defaults, overridable via environment variables.
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const RETENTION_HORIZON_SECS: u64 = 180;
    pub const REFRESH_INTERVAL_SECS: u64 = 5;
    pub const POLL_INTERVAL_MS: u64 = 500;
    pub const FETCH_LIMIT: usize = 100;
    pub const TOP_N: usize = 10;
    pub const LOCAL_TOP_K: usize = 100;
    pub const FETCH_TIMEOUT_SECS: u64 = 2;
    pub const SINK_TIMEOUT_SECS: u64 = 5;

    fn env_u64(name: &str, default: u64) -> u64 {
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    fn env_usize(name: &str, default: usize) -> usize {
        std::env::var(name)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    pub fn retention_horizon() -> Duration {
        Duration::from_secs(Self::env_u64(
            "REVIEWSTREAM_RETENTION_SECS",
            Self::RETENTION_HORIZON_SECS,
        ))
    }

    pub fn refresh_interval() -> Duration {
        Duration::from_secs(Self::env_u64(
            "REVIEWSTREAM_REFRESH_SECS",
            Self::REFRESH_INTERVAL_SECS,
        ))
    }

    pub fn top_n() -> usize {
        Self::env_usize("REVIEWSTREAM_TOP_N", Self::TOP_N)
    }

    pub fn local_top_k() -> usize {
        Self::env_usize("REVIEWSTREAM_LOCAL_TOP_K", Self::LOCAL_TOP_K)
    }
}

/// Configuration for the streaming window pipeline.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// How long events stay in the sliding window.
    pub retention_horizon: Duration,
    /// Scheduler tick interval between snapshots.
    pub refresh_interval: Duration,
    /// Number of top words to include in each snapshot.
    pub top_n: usize,
    /// Interval between source poll sweeps.
    pub poll_interval: Duration,
    /// Maximum records fetched per partition per sweep.
    pub fetch_limit: usize,
    /// Bounded wait for a single partition fetch; a timeout is a
    /// transient per-partition error, never fatal.
    pub fetch_timeout: Duration,
    /// Bounded wait for sink emission so a slow sink cannot stall the
    /// scheduler.
    pub sink_timeout: Duration,
    /// Optional safety cap on window size. When eviction falls behind,
    /// the oldest entries beyond the cap are dropped with a warning.
    pub window_cap: Option<usize>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retention_horizon: ConfigDefaults::retention_horizon(),
            refresh_interval: ConfigDefaults::refresh_interval(),
            top_n: ConfigDefaults::top_n(),
            poll_interval: Duration::from_millis(ConfigDefaults::POLL_INTERVAL_MS),
            fetch_limit: ConfigDefaults::FETCH_LIMIT,
            fetch_timeout: Duration::from_secs(ConfigDefaults::FETCH_TIMEOUT_SECS),
            sink_timeout: Duration::from_secs(ConfigDefaults::SINK_TIMEOUT_SECS),
            window_cap: None,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention_horizon(mut self, horizon: Duration) -> Self {
        self.retention_horizon = horizon;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn with_window_cap(mut self, cap: usize) -> Self {
        self.window_cap = Some(cap);
        self
    }

    /// Validate at startup. Configuration errors are the only fatal class.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        if self.retention_horizon.is_zero() {
            return Err(ConfigError::ZeroRetention);
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }
}

/// Configuration for the batch partition runner.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of top words reported per run.
    pub top_n: usize,
    /// Partition-local truncation bound for the approximate merge.
    pub local_top_k: usize,
    /// Number of partitions (and parallel workers) per run.
    pub partition_count: usize,
    /// Dataset percentages, each in 1..=100.
    pub load_fractions: Vec<u8>,
    /// Tokenization profile for the wordcount task.
    pub tokenizer: TokenizerProfile,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            top_n: ConfigDefaults::top_n(),
            local_top_k: ConfigDefaults::local_top_k(),
            partition_count: default_partition_count(),
            load_fractions: vec![25, 50, 75, 100],
            tokenizer: TokenizerProfile::AlnumOnly,
        }
    }
}

fn default_partition_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_local_top_k(mut self, local_top_k: usize) -> Self {
        self.local_top_k = local_top_k;
        self
    }

    pub fn with_partition_count(mut self, partitions: usize) -> Self {
        self.partition_count = partitions;
        self
    }

    pub fn with_load_fractions(mut self, fractions: Vec<u8>) -> Self {
        self.load_fractions = fractions;
        self
    }

    pub fn with_tokenizer(mut self, profile: TokenizerProfile) -> Self {
        self.tokenizer = profile;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        if self.local_top_k == 0 {
            return Err(ConfigError::ZeroLocalTopK);
        }
        if self.partition_count == 0 {
            return Err(ConfigError::ZeroPartitions);
        }
        if self.load_fractions.is_empty() {
            return Err(ConfigError::EmptyLoadFractions);
        }
        for &fraction in &self.load_fractions {
            if fraction == 0 || fraction > 100 {
                return Err(ConfigError::FractionOutOfRange(fraction));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.retention_horizon, Duration::from_secs(180));
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.fetch_limit, 100);
        assert!(config.window_cap.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.local_top_k, 100);
        assert_eq!(config.load_fractions, vec![25, 50, 75, 100]);
        assert!(config.partition_count >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chains() {
        let config = StreamConfig::new()
            .with_retention_horizon(Duration::from_secs(60))
            .with_refresh_interval(Duration::from_secs(1))
            .with_top_n(3)
            .with_window_cap(10_000);
        assert_eq!(config.retention_horizon, Duration::from_secs(60));
        assert_eq!(config.window_cap, Some(10_000));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            StreamConfig::new().with_top_n(0).validate(),
            Err(ConfigError::ZeroTopN)
        ));
        assert!(matches!(
            BatchConfig::new().with_load_fractions(vec![]).validate(),
            Err(ConfigError::EmptyLoadFractions)
        ));
        assert!(matches!(
            BatchConfig::new().with_load_fractions(vec![120]).validate(),
            Err(ConfigError::FractionOutOfRange(120))
        ));
        assert!(matches!(
            BatchConfig::new().with_partition_count(0).validate(),
            Err(ConfigError::ZeroPartitions)
        ));
    }
}

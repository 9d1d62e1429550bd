//! Snapshot scheduler
//!
//! Runs on a fixed cadence over the sliding window store: evict expired
//! events, take a stable view, aggregate, reduce to the exact top-N, and
//! deliver a [`WindowSnapshot`] to the sink. Ticks over an empty window
//! are skipped entirely; no empty snapshots are ever emitted.
//!
//! Sink delivery is fire-and-forget with a bounded wait: a slow or failing
//! sink is logged and never stalls or stops the scheduler.

use crate::reviewstream::aggregate::aggregate;
use crate::reviewstream::config::StreamConfig;
use crate::reviewstream::datasource::traits::SnapshotSink;
use crate::reviewstream::model::WindowSnapshot;
use crate::reviewstream::topn::top_n_exact;
use crate::reviewstream::window::SlidingWindowStore;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::timeout;

/// Scheduler state machine: idle between ticks, emitting during one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Emitting,
}

/// Counters describing scheduler activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    /// Ticks processed, including skipped ones.
    pub ticks: u64,
    /// Snapshots actually delivered to the sink.
    pub snapshots_emitted: u64,
    /// Ticks skipped because the window was empty.
    pub empty_ticks_skipped: u64,
    /// Emissions that failed or timed out at the sink.
    pub sink_failures: u64,
}

/// Periodically turns the sliding window into `WindowSnapshot`s.
pub struct SnapshotScheduler {
    window: Arc<SlidingWindowStore>,
    sink: Arc<dyn SnapshotSink>,
    config: StreamConfig,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl SnapshotScheduler {
    pub fn new(
        window: Arc<SlidingWindowStore>,
        sink: Arc<dyn SnapshotSink>,
        config: StreamConfig,
    ) -> Self {
        Self {
            window,
            sink,
            config,
            state: SchedulerState::Idle,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run ticks on the configured cadence until the stop signal flips.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> SchedulerStats {
        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_once(Utc::now()).await;
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!(
            "Snapshot scheduler stopped: {} snapshot(s) emitted over {} tick(s)",
            self.stats.snapshots_emitted, self.stats.ticks
        );
        self.stats
    }

    /// One full tick at an explicit instant. Public so tests can drive the
    /// scheduler deterministically.
    pub async fn tick_once(&mut self, now: DateTime<Utc>) -> Option<WindowSnapshot> {
        self.stats.ticks += 1;
        self.state = SchedulerState::Emitting;

        let view = self.window.snapshot_view(now);
        if view.is_empty() {
            self.stats.empty_ticks_skipped += 1;
            self.state = SchedulerState::Idle;
            return None;
        }

        let (words, sentiments) = aggregate(&view);
        let snapshot = WindowSnapshot {
            as_of: now,
            top_words: top_n_exact(&words, self.config.top_n),
            sentiment_distribution: sentiments.into_map(),
            window_len: view.len(),
        };

        match timeout(
            self.config.sink_timeout,
            self.sink.emit_snapshot(&snapshot),
        )
        .await
        {
            Ok(Ok(())) => {
                self.stats.snapshots_emitted += 1;
            }
            Ok(Err(e)) => {
                self.stats.sink_failures += 1;
                warn!("Sink rejected snapshot: {}", e);
            }
            Err(_) => {
                self.stats.sink_failures += 1;
                warn!(
                    "Sink emission timed out after {:?}",
                    self.config.sink_timeout
                );
            }
        }

        self.state = SchedulerState::Idle;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviewstream::datasource::memory::CollectingSink;
    use crate::reviewstream::error::BoxedError;
    use crate::reviewstream::model::{BatchReport, Event, Sentiment};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    fn event_at(secs: i64, tokens: &[&str]) -> Event {
        Event::new(
            Utc.timestamp_opt(secs, 0).unwrap(),
            tokens.iter().map(|t| t.to_string()).collect(),
            Sentiment::Positive,
        )
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_tick_evicts_aggregates_and_emits() {
        // Retention 180s: events at t=0, 60, 170, 200; tick at t=205
        // evicts only the t=0 event.
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        window.append(event_at(0, &["a"]));
        window.append(event_at(60, &["a", "b"]));
        window.append(event_at(170, &["b"]));
        window.append(event_at(200, &["c"]));

        let sink = Arc::new(CollectingSink::new());
        let config = StreamConfig::new().with_top_n(2);
        let mut scheduler =
            SnapshotScheduler::new(Arc::clone(&window), Arc::clone(&sink) as _, config);

        let snapshot = scheduler.tick_once(at(205)).await.unwrap();
        assert_eq!(snapshot.window_len, 3);
        // Counter {a:1, b:2, c:1}; top-2 is b then a ("a" seen before "c").
        assert_eq!(
            snapshot.top_words,
            vec![("b".to_string(), 2), ("a".to_string(), 1)]
        );
        assert_eq!(
            snapshot.sentiment_distribution.get(&Sentiment::Positive),
            Some(&3)
        );

        assert_eq!(sink.snapshots().len(), 1);
        assert_eq!(scheduler.stats().snapshots_emitted, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_empty_window_skips_emission() {
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let sink = Arc::new(CollectingSink::new());
        let mut scheduler = SnapshotScheduler::new(
            Arc::clone(&window),
            Arc::clone(&sink) as _,
            StreamConfig::new(),
        );

        assert!(scheduler.tick_once(at(100)).await.is_none());
        assert!(sink.snapshots().is_empty());
        assert_eq!(scheduler.stats().empty_ticks_skipped, 1);
    }

    struct FailingSink;

    #[async_trait]
    impl SnapshotSink for FailingSink {
        async fn emit_snapshot(&self, _: &WindowSnapshot) -> Result<(), BoxedError> {
            Err("sink offline".into())
        }

        async fn emit_report(&self, _: &BatchReport) -> Result<(), BoxedError> {
            Err("sink offline".into())
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_not_fatal() {
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        window.append(event_at(100, &["w"]));
        let mut scheduler = SnapshotScheduler::new(
            Arc::clone(&window),
            Arc::new(FailingSink),
            StreamConfig::new(),
        );

        // The tick still completes and produces a snapshot.
        let snapshot = scheduler.tick_once(at(101)).await;
        assert!(snapshot.is_some());
        assert_eq!(scheduler.stats().sink_failures, 1);
        assert_eq!(scheduler.stats().snapshots_emitted, 0);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let window = Arc::new(SlidingWindowStore::new(Duration::from_secs(180)));
        let sink = Arc::new(CollectingSink::new());
        let config = StreamConfig::new().with_refresh_interval(Duration::from_millis(10));
        let scheduler =
            SnapshotScheduler::new(Arc::clone(&window), Arc::clone(&sink) as _, config);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(stop_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert!(stats.ticks >= 1);
    }
}

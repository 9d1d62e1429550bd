//! Streaming pipeline wiring
//!
//! Connects an ingest adapter and a snapshot scheduler to one shared
//! sliding window store, runs both as supervised tokio tasks, and exposes
//! a cooperative stop signal with a defined shutdown contract: in-flight
//! fetches and emissions complete, then the tasks exit.

use crate::reviewstream::config::StreamConfig;
use crate::reviewstream::datasource::traits::{ReviewSource, SnapshotSink};
use crate::reviewstream::datasource::types::StartPosition;
use crate::reviewstream::error::IngestError;
use crate::reviewstream::ingest::{IngestAdapter, IngestMetrics};
use crate::reviewstream::scheduler::{SchedulerStats, SnapshotScheduler};
use crate::reviewstream::window::{SlidingWindowStore, WindowStats};
use log::info;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Running streaming pipeline: one ingest task, one scheduler task, one
/// shared window store.
pub struct StreamPipeline {
    window: Arc<SlidingWindowStore>,
    ingest_metrics: Arc<IngestMetrics>,
    stop_tx: watch::Sender<bool>,
    ingest_task: JoinHandle<()>,
    scheduler_task: JoinHandle<SchedulerStats>,
}

impl StreamPipeline {
    /// Validate the configuration, connect to the source, and spawn the
    /// ingest and scheduler tasks.
    ///
    /// Only two things can fail here, and both are startup-fatal by
    /// design: invalid configuration and an unreachable source.
    pub async fn spawn(
        source: Arc<dyn ReviewSource>,
        sink: Arc<dyn SnapshotSink>,
        config: StreamConfig,
        position: StartPosition,
    ) -> Result<Self, IngestError> {
        config
            .validate()
            .map_err(|e| IngestError::ConnectFailed {
                reason: e.to_string(),
            })?;

        let window = Arc::new(SlidingWindowStore::with_cap(
            config.retention_horizon,
            config.window_cap,
        ));
        let adapter = IngestAdapter::connect(
            source,
            Arc::clone(&window),
            config.clone(),
            position,
        )
        .await?;
        let ingest_metrics = adapter.metrics();
        let scheduler = SnapshotScheduler::new(Arc::clone(&window), sink, config);

        let (stop_tx, stop_rx) = watch::channel(false);
        let ingest_task = tokio::spawn(adapter.run(stop_rx.clone()));
        let scheduler_task = tokio::spawn(scheduler.run(stop_rx));

        info!("Stream pipeline started");
        Ok(Self {
            window,
            ingest_metrics,
            stop_tx,
            ingest_task,
            scheduler_task,
        })
    }

    pub fn window_stats(&self) -> WindowStats {
        self.window.stats()
    }

    pub fn ingest_metrics(&self) -> &IngestMetrics {
        &self.ingest_metrics
    }

    /// Signal both tasks to stop and wait for them to drain.
    pub async fn shutdown(self) -> SchedulerStats {
        // Receivers treat a dropped sender like a stop, so send errors
        // only mean the tasks are already gone.
        let _ = self.stop_tx.send(true);
        let _ = self.ingest_task.await;
        self.scheduler_task.await.unwrap_or_default()
    }
}

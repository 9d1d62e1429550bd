//! Source, sink, and storage abstraction traits
//!
//! These traits isolate the aggregation engine from transport and
//! presentation concerns. A `ReviewSource` can be backed by a sharded
//! stream service, a replayed file, or an in-memory script; a
//! `SnapshotSink` can render a dashboard, write JSON lines, or collect
//! results in tests; a `StorageGateway` stages datasets and result
//! artifacts by key.

use crate::reviewstream::datasource::types::{Cursor, FetchBatch, PartitionId, StartPosition};
use crate::reviewstream::error::BoxedError;
use crate::reviewstream::model::{BatchReport, WindowSnapshot};
use async_trait::async_trait;

/// Abstract producer of partitioned review record streams.
///
/// Each partition advances its own cursor independently; a failure on one
/// partition must never block fetches on its siblings.
#[async_trait]
pub trait ReviewSource: Send + Sync + 'static {
    /// List the partitions this source currently exposes.
    async fn describe_partitions(&self) -> Result<Vec<PartitionId>, BoxedError>;

    /// Open a cursor on one partition at the given position.
    async fn open_cursor(
        &self,
        partition: &PartitionId,
        position: StartPosition,
    ) -> Result<Cursor, BoxedError>;

    /// Fetch up to `max_records` from the cursor position.
    ///
    /// Implementations should return promptly; the ingest adapter applies
    /// its own bounded wait and treats a timeout as a transient error.
    async fn fetch(&self, cursor: &Cursor, max_records: usize) -> Result<FetchBatch, BoxedError>;
}

/// Abstract consumer of produced snapshots and reports.
///
/// Emission is fire-and-forget from the engine's point of view: failures
/// are logged by the caller and never propagated as fatal, and the
/// scheduler bounds how long it will wait for an emit to complete.
#[async_trait]
pub trait SnapshotSink: Send + Sync + 'static {
    async fn emit_snapshot(&self, snapshot: &WindowSnapshot) -> Result<(), BoxedError>;

    async fn emit_report(&self, report: &BatchReport) -> Result<(), BoxedError>;
}

/// Abstract byte store keyed by string, used to stage input datasets and
/// persist batch result artifacts.
///
/// Callers retry failed operations a small fixed number of times (see
/// [`get_with_retry`](crate::reviewstream::datasource::storage::get_with_retry)
/// and its `put` counterpart) and then continue without the artifact.
#[async_trait]
pub trait StorageGateway: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxedError>;

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BoxedError>;
}

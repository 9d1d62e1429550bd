//! Source, sink, and storage abstractions
//!
//! The aggregation engine never talks to a transport directly: records
//! arrive through [`ReviewSource`], results leave through
//! [`SnapshotSink`], and artifacts are staged through [`StorageGateway`].

pub mod memory;
pub mod sinks;
pub mod storage;
pub mod traits;
pub mod types;

pub use memory::{CollectingSink, InMemorySource, InMemoryStorage, review_record};
pub use sinks::{JsonLinesSink, LogSink};
pub use storage::{LocalFileStorage, get_with_retry, put_with_retry};
pub use traits::{ReviewSource, SnapshotSink, StorageGateway};
pub use types::{Cursor, FetchBatch, PartitionId, RawRecord, StartPosition};

//! Generic source type definitions
//!
//! These types are independent of any concrete transport and are shared by
//! every `ReviewSource` implementation.

use std::fmt;

/// Identifier of one independently-cursored subdivision of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId(pub String);

impl PartitionId {
    pub fn new(id: impl Into<String>) -> Self {
        PartitionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionId {
    fn from(id: &str) -> Self {
        PartitionId(id.to_string())
    }
}

/// Where to open a cursor on a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Only records produced after the cursor was opened.
    Latest,
    /// The oldest retained record.
    Earliest,
}

/// An advancing read position within one partition.
///
/// The token is source-specific and opaque to the ingest adapter; each
/// fetch returns the successor cursor (or none when the partition is
/// closed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub partition: PartitionId,
    pub token: String,
}

impl Cursor {
    pub fn new(partition: PartitionId, token: impl Into<String>) -> Self {
        Self {
            partition,
            token: token.into(),
        }
    }
}

/// One raw record as fetched from a partition, before parsing.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub data: Vec<u8>,
}

impl RawRecord {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

/// Result of one partition fetch: the records plus the cursor to use for
/// the next fetch. `next_cursor == None` means the partition has closed.
#[derive(Debug, Clone)]
pub struct FetchBatch {
    pub records: Vec<RawRecord>,
    pub next_cursor: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_id_display() {
        let id = PartitionId::from("shard-0001");
        assert_eq!(id.to_string(), "shard-0001");
        assert_eq!(id.as_str(), "shard-0001");
    }

    #[test]
    fn test_cursor_carries_partition() {
        let cursor = Cursor::new(PartitionId::from("shard-0001"), "offset:42");
        assert_eq!(cursor.partition.as_str(), "shard-0001");
        assert_eq!(cursor.token, "offset:42");
    }
}

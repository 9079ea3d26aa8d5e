use async_trait::async_trait;
use bytes::Bytes;

use crate::error::LogError;

/// One record read back from the durable log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The partition key the record was written under.
    pub key: Bytes,
    /// The serialized payload.
    pub value: Bytes,
    /// The partition the record landed on.
    pub partition: u32,
    /// Offset of the record within its partition.
    pub offset: u64,
    /// Append time as epoch milliseconds.
    pub timestamp_ms: i64,
}

/// Partitioned, append-only, at-least-once durable log.
///
/// All records written under one key land on the same partition, so their
/// relative order is preserved at the consumer. Implementations must be
/// `Send + Sync` and safe for concurrent writers.
#[async_trait]
pub trait DurableLog: Send + Sync {
    /// Append `value` under the partition selected by `key`.
    async fn write(&self, key: &[u8], value: &[u8]) -> Result<(), LogError>;
}

/// Consumer-group read cursor over a [`DurableLog`].
///
/// `next` suspends while no record is available and resumes on new
/// arrivals; it must be cancel-safe so callers can race it against a
/// cancellation signal. The commit policy (per-record vs. batch) is the
/// backend's choice.
#[async_trait]
pub trait LogCursor: Send {
    /// Read the next available record, suspending while the log is empty.
    async fn next(&mut self) -> Result<Record, LogError>;

    /// Mark a record as processed for this cursor's consumer group.
    async fn commit(&mut self, record: &Record) -> Result<(), LogError>;
}

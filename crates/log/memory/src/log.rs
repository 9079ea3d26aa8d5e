use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use escalon_log::{DurableLog, LogCursor, LogError, Record};

const DEFAULT_PARTITIONS: u32 = 4;

/// FNV-1a over the partition key. Stability is the only requirement: the
/// same key always selects the same partition for the log's lifetime.
fn partition_for(key: &[u8], partitions: u32) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in key {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash % partitions
}

struct Partition {
    records: Mutex<Vec<Record>>,
}

struct Inner {
    partitions: Vec<Partition>,
    /// Committed offsets per consumer group, one slot per partition.
    groups: DashMap<String, Vec<u64>>,
    arrivals: Notify,
    closed: AtomicBool,
}

/// In-memory partitioned [`DurableLog`].
///
/// Records for one key always land on the same partition, so their relative
/// order is preserved. Cursors commit per record; a new cursor for an
/// existing consumer group resumes from the group's committed offsets.
#[derive(Clone)]
pub struct MemoryLog {
    inner: Arc<Inner>,
}

impl MemoryLog {
    /// Create a log with the default partition count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Create a log with `partitions` partitions (at least one).
    #[must_use]
    pub fn with_partitions(partitions: u32) -> Self {
        let partitions = partitions.max(1);
        let inner = Inner {
            partitions: (0..partitions)
                .map(|_| Partition {
                    records: Mutex::new(Vec::new()),
                })
                .collect(),
            groups: DashMap::new(),
            arrivals: Notify::new(),
            closed: AtomicBool::new(false),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Open a cursor for `group`, resuming from its committed offsets.
    #[must_use]
    pub fn cursor(&self, group: &str) -> MemoryCursor {
        let positions = self
            .inner
            .groups
            .get(group)
            .map_or_else(|| vec![0; self.inner.partitions.len()], |g| g.clone());
        MemoryCursor {
            inner: Arc::clone(&self.inner),
            group: group.to_owned(),
            positions,
            next_partition: 0,
        }
    }

    /// Close the log: pending and future reads drain remaining records and
    /// then return [`LogError::Closed`].
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.arrivals.notify_waiters();
    }

    /// Total number of records across all partitions.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner
            .partitions
            .iter()
            .map(|p| p.records.lock().len())
            .sum()
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableLog for MemoryLog {
    async fn write(&self, key: &[u8], value: &[u8]) -> Result<(), LogError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(LogError::Closed);
        }

        let idx = partition_for(key, u32::try_from(self.inner.partitions.len()).unwrap_or(1));
        {
            let mut records = self.inner.partitions[idx as usize].records.lock();
            let offset = records.len() as u64;
            records.push(Record {
                key: Bytes::copy_from_slice(key),
                value: Bytes::copy_from_slice(value),
                partition: idx,
                offset,
                timestamp_ms: Utc::now().timestamp_millis(),
            });
        }
        self.inner.arrivals.notify_waiters();
        Ok(())
    }
}

/// Cursor over a [`MemoryLog`], scanning partitions round-robin.
pub struct MemoryCursor {
    inner: Arc<Inner>,
    group: String,
    positions: Vec<u64>,
    next_partition: usize,
}

impl MemoryCursor {
    fn poll_partitions(&mut self) -> Option<Record> {
        let n = self.inner.partitions.len();
        for step in 0..n {
            let idx = (self.next_partition + step) % n;
            let records = self.inner.partitions[idx].records.lock();
            let pos = self.positions[idx] as usize;
            if let Some(record) = records.get(pos) {
                let record = record.clone();
                drop(records);
                self.positions[idx] += 1;
                self.next_partition = (idx + 1) % n;
                return Some(record);
            }
        }
        None
    }
}

#[async_trait]
impl LogCursor for MemoryCursor {
    async fn next(&mut self) -> Result<Record, LogError> {
        loop {
            // Register with the Notify before scanning: `notify_waiters`
            // only wakes already-enabled futures, so a write landing
            // between the scan and the await would otherwise be missed.
            let inner = Arc::clone(&self.inner);
            let mut arrivals = pin!(inner.arrivals.notified());
            arrivals.as_mut().enable();

            if let Some(record) = self.poll_partitions() {
                return Ok(record);
            }
            if self.inner.closed.load(Ordering::SeqCst) {
                return Err(LogError::Closed);
            }

            arrivals.await;
        }
    }

    async fn commit(&mut self, record: &Record) -> Result<(), LogError> {
        let mut group = self
            .inner
            .groups
            .entry(self.group.clone())
            .or_insert_with(|| vec![0; self.inner.partitions.len()]);
        let slot = record.partition as usize;
        if group[slot] < record.offset + 1 {
            group[slot] = record.offset + 1;
        }
        Ok(())
    }
}

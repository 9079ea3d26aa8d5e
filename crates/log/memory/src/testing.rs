//! Test doubles for exercising producer retry behavior.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use escalon_log::{DurableLog, LogError};

use crate::MemoryLog;

/// [`DurableLog`] that fails the first `failures` writes with a transient
/// error, then delegates to an inner [`MemoryLog`].
///
/// With `failures = u32::MAX` every write fails, for exhaustion tests.
pub struct FlakyLog {
    inner: MemoryLog,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyLog {
    /// Wrap `inner`, failing the first `failures` writes.
    #[must_use]
    pub fn new(inner: MemoryLog, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    /// Total write attempts observed, successful or not.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Access the wrapped log.
    #[must_use]
    pub fn inner(&self) -> &MemoryLog {
        &self.inner
    }
}

#[async_trait]
impl DurableLog for FlakyLog {
    async fn write(&self, key: &[u8], value: &[u8]) -> Result<(), LogError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(LogError::Unavailable("flaky".into()));
        }
        self.inner.write(key, value).await
    }
}

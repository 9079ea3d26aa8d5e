//! Conformance tests for durable log backends.
//!
//! Call [`run_log_conformance_tests`] from a backend's test module with a
//! fresh log instance and a cursor factory.

use crate::error::LogError;
use crate::log::{DurableLog, LogCursor};

/// Run the full durable-log conformance test suite.
///
/// `cursor` must yield a fresh cursor for a fresh consumer group each call.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_log_conformance_tests<F>(
    log: &dyn DurableLog,
    mut cursor: F,
) -> Result<(), LogError>
where
    F: FnMut() -> Box<dyn LogCursor>,
{
    test_write_then_read(log, cursor()).await?;
    test_per_key_order(log, cursor()).await?;
    Ok(())
}

async fn test_write_then_read(
    log: &dyn DurableLog,
    mut cursor: Box<dyn LogCursor>,
) -> Result<(), LogError> {
    log.write(b"conformance-key", b"payload").await?;

    let record = cursor.next().await?;
    assert_eq!(&record.key[..], b"conformance-key");
    assert_eq!(&record.value[..], b"payload");
    cursor.commit(&record).await?;
    Ok(())
}

async fn test_per_key_order(
    log: &dyn DurableLog,
    mut cursor: Box<dyn LogCursor>,
) -> Result<(), LogError> {
    for i in 0u8..5 {
        log.write(b"ordered-key", &[i]).await?;
    }

    let mut seen = Vec::new();
    while seen.len() < 5 {
        let record = cursor.next().await?;
        if &record.key[..] == b"ordered-key" {
            seen.push(record.value[0]);
        }
        cursor.commit(&record).await?;
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4], "per-key order must be preserved");
    Ok(())
}

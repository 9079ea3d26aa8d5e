//! The durable-path consumer: replays the log into the message store and
//! re-runs rule evaluation over persisted history.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use escalon_core::decode_chunk;
use escalon_log::{LogCursor, LogError};
use escalon_rules::Analyzer;
use escalon_store::MessageStore;

/// Pause after a failed cursor read; a down backend must not spin the loop.
const READ_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Reads chunk records off a log cursor, persists them, and evaluates the
/// rule set against the conversation's accumulated counts.
///
/// Every failure on a single record is logged and the record is skipped;
/// the loop only ends on shutdown or when the log closes. Records are
/// committed one at a time, after processing, so a crash replays at most
/// the in-flight record (at-least-once, duplicates tolerated).
pub struct RelayConsumer {
    store: Arc<dyn MessageStore>,
    analyzer: Analyzer,
}

impl RelayConsumer {
    /// Create a consumer persisting to `store` and evaluating with its own
    /// `analyzer` instance, independent of the in-stream path.
    pub fn new(store: Arc<dyn MessageStore>, analyzer: Analyzer) -> Self {
        Self { store, analyzer }
    }

    /// Drive the consume loop until `cancel` fires or the log closes.
    pub async fn run<C: LogCursor>(&self, cancel: &CancellationToken, cursor: &mut C) {
        info!("consumer started");
        loop {
            let record = tokio::select! {
                () = cancel.cancelled() => break,
                record = cursor.next() => match record {
                    Ok(record) => record,
                    Err(LogError::Closed) => break,
                    Err(e) => {
                        warn!(error = %e, "cursor read failed");
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(READ_RETRY_DELAY) => {}
                        }
                        continue;
                    }
                },
            };

            match decode_chunk(&record.value) {
                Ok(chunk) => {
                    let saved = self
                        .store
                        .save_message(&chunk.conversation_id, &chunk.text, chunk.timestamp_ms)
                        .await;
                    match saved {
                        Ok(()) => {
                            if let Err(e) = self.analyzer.process_chunk(&chunk).await {
                                warn!(
                                    conversation_id = %chunk.conversation_id,
                                    sequence = chunk.sequence,
                                    error = %e,
                                    "durable-path analysis failed, skipping record"
                                );
                            }
                        }
                        Err(e) => {
                            warn!(
                                conversation_id = %chunk.conversation_id,
                                sequence = chunk.sequence,
                                error = %e,
                                "failed to persist message, skipping record"
                            );
                        }
                    }
                    debug!(
                        partition = record.partition,
                        offset = record.offset,
                        conversation_id = %chunk.conversation_id,
                        "record consumed"
                    );
                }
                Err(e) => {
                    // A record that cannot decode never will; skip past it.
                    warn!(
                        partition = record.partition,
                        offset = record.offset,
                        error = %e,
                        "malformed record, skipping"
                    );
                }
            }

            if let Err(e) = cursor.commit(&record).await {
                warn!(
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "commit failed"
                );
            }
        }
        info!("consumer stopped");
    }
}

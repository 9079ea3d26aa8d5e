//! Retrying chunk producer for the durable log.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use escalon_core::{Chunk, encode_chunk};
use escalon_log::DurableLog;

use crate::error::RelayError;

/// Retry policy for [`ChunkProducer::publish`].
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Retries after the first attempt, so a chunk gets
    /// `1 + max_retries` write attempts in total.
    pub max_retries: u32,
    /// Backoff grows linearly: the wait before retry `n` (1-based) is
    /// `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_millis(100),
        }
    }
}

/// Publishes chunks to the durable log, keyed by conversation so all chunks
/// of one conversation land on the same partition.
///
/// Each publish retries independently; a chunk exhausting its retries does
/// not poison the producer for later chunks.
pub struct ChunkProducer {
    log: Arc<dyn DurableLog>,
    config: ProducerConfig,
}

impl ChunkProducer {
    /// Create a producer over `log` with the default retry policy.
    pub fn new(log: Arc<dyn DurableLog>) -> Self {
        Self::with_config(log, ProducerConfig::default())
    }

    /// Create a producer with an explicit retry policy.
    pub fn with_config(log: Arc<dyn DurableLog>, config: ProducerConfig) -> Self {
        Self { log, config }
    }

    /// Write one chunk, retrying transient failures with linear backoff.
    ///
    /// Returns [`RelayError::Cancelled`] as soon as `cancel` fires, whether
    /// mid-backoff or between attempts. Returns
    /// [`RelayError::PublishFailed`] once the final attempt fails or the
    /// error is not retryable.
    pub async fn publish(
        &self,
        cancel: &CancellationToken,
        chunk: &Chunk,
    ) -> Result<(), RelayError> {
        let key = chunk.conversation_id.as_str().as_bytes().to_vec();
        let value = encode_chunk(chunk);

        for attempt in 0..=self.config.max_retries {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }

            match self.log.write(&key, &value).await {
                Ok(()) => {
                    debug!(
                        conversation_id = %chunk.conversation_id,
                        sequence = chunk.sequence,
                        attempt = attempt + 1,
                        "chunk published"
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.config.max_retries && e.is_retryable() => {
                    warn!(
                        conversation_id = %chunk.conversation_id,
                        sequence = chunk.sequence,
                        attempt = attempt + 1,
                        error = %e,
                        "publish attempt failed, backing off"
                    );
                    let backoff = self.config.backoff_unit * (attempt + 1);
                    tokio::select! {
                        () = cancel.cancelled() => return Err(RelayError::Cancelled),
                        () = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(e) => {
                    return Err(RelayError::PublishFailed {
                        attempts: attempt + 1,
                        source: e,
                    });
                }
            }
        }

        unreachable!("loop returns on the final attempt")
    }
}

use thiserror::Error;

use escalon_log::LogError;

/// Errors surfaced by the relay producer and ingestion path.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Every write attempt for one chunk failed; the chunk is dropped from
    /// the durable path and the pipeline moves on.
    #[error("publish failed after {attempts} attempts: {source}")]
    PublishFailed {
        attempts: u32,
        #[source]
        source: LogError,
    },

    /// The operation was interrupted by shutdown before it could complete.
    #[error("cancelled by shutdown")]
    Cancelled,
}

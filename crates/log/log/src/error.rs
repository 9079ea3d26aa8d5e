use thiserror::Error;

/// Errors surfaced by durable log backends.
#[derive(Debug, Error)]
pub enum LogError {
    /// Transient infrastructure failure; producers retry with backoff.
    #[error("log unavailable: {0}")]
    Unavailable(String),

    /// The log was closed; consumers end their loop.
    #[error("log closed")]
    Closed,

    /// Backend input/output failure.
    #[error("log io error: {0}")]
    Io(String),
}

impl LogError {
    /// Whether a producer should retry after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

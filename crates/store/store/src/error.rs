use thiserror::Error;

/// Errors surfaced by collaborator stores.
///
/// `Unavailable` is transient infrastructure failure; callers log and skip
/// the affected unit of work rather than halting the pipeline.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

use async_trait::async_trait;

use escalon_core::{ConversationId, WordCounts};

use crate::error::StoreError;

/// Persistent message history for conversations.
///
/// `get_word_counts` may be a live re-tokenization of stored history rather
/// than a cached aggregate; callers must not assume it is cheap.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one message to the conversation's history.
    async fn save_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
        timestamp_ms: i64,
    ) -> Result<(), StoreError>;

    /// Aggregate word counts over the conversation's stored history.
    async fn get_word_counts(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<WordCounts, StoreError>;
}

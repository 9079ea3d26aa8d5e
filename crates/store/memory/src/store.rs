use async_trait::async_trait;
use dashmap::DashMap;

use escalon_core::{ConversationId, WordCounts};
use escalon_store::{MessageStore, StoreError};

/// In-memory [`MessageStore`] keyed by conversation id.
///
/// `get_word_counts` re-tokenizes the stored history on every call rather
/// than keeping a cached aggregate, matching the live-aggregation behavior
/// of the relational backend it stands in for.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    messages: DashMap<String, Vec<(String, i64)>>,
}

impl MemoryMessageStore {
    /// Create a new, empty message store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages stored for a conversation.
    #[must_use]
    pub fn message_count(&self, conversation_id: &ConversationId) -> usize {
        self.messages
            .get(conversation_id.as_str())
            .map_or(0, |history| history.len())
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
        timestamp_ms: i64,
    ) -> Result<(), StoreError> {
        self.messages
            .entry(conversation_id.as_str().to_owned())
            .or_default()
            .push((content.to_owned(), timestamp_ms));
        Ok(())
    }

    async fn get_word_counts(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<WordCounts, StoreError> {
        let mut counts = WordCounts::new();
        if let Some(history) = self.messages.get(conversation_id.as_str()) {
            for (content, _) in history.iter() {
                counts.ingest(content);
            }
        }
        Ok(counts)
    }
}

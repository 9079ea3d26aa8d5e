use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, ParticipantId};

/// One ordered unit of conversational text attributed to a conversation and
/// participant.
///
/// Chunks are immutable once created. Ordering is defined by `sequence`
/// within a `conversation_id`, never by arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The conversation this chunk belongs to.
    pub conversation_id: ConversationId,
    /// The participant who produced the fragment.
    pub participant_id: ParticipantId,
    /// Monotonic per-conversation sequence number.
    pub sequence: u64,
    /// The raw text of the fragment.
    pub text: String,
    /// Production time as epoch milliseconds.
    pub timestamp_ms: i64,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        participant_id: impl Into<ParticipantId>,
        sequence: u64,
        text: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            participant_id: participant_id.into(),
            sequence,
            text: text.into(),
            timestamp_ms,
        }
    }
}

/// Terminal response to an ingestion stream once the client signals
/// completion. Sent exactly once per stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    /// The last conversation seen on the stream, if any chunk arrived.
    pub conversation_id: Option<ConversationId>,
    /// The last sequence number seen on the stream, if any chunk arrived.
    pub last_sequence: Option<u64>,
    /// Whether the stream was processed to completion.
    pub success: bool,
    /// Human-readable status.
    pub message: String,
}

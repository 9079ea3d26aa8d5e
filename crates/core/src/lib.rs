pub mod chunk;
pub mod counts;
pub mod event;
pub mod rule;
pub mod types;
pub mod wire;

pub use chunk::{Acknowledgment, Chunk};
pub use counts::{WordCounts, tokenize};
pub use event::EscalationEvent;
pub use rule::{Condition, Rule};
pub use types::{ConversationId, ParticipantId};
pub use wire::{WireError, decode_chunk, encode_chunk};

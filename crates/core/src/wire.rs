//! Compact binary wire format for chunks written to the durable log.
//!
//! Records are length-delimited protobuf so the consumer can reject a
//! malformed record and advance without wedging the pipeline.

use bytes::Bytes;
use prost::Message;
use thiserror::Error;

use crate::chunk::Chunk;

/// Failure to decode a durable-log record back into a [`Chunk`].
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed chunk record: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Wire-level representation of a [`Chunk`].
#[derive(Clone, PartialEq, Message)]
struct ChunkRecord {
    #[prost(string, tag = "1")]
    conversation_id: String,
    #[prost(string, tag = "2")]
    participant_id: String,
    #[prost(uint64, tag = "3")]
    sequence: u64,
    #[prost(string, tag = "4")]
    text: String,
    #[prost(int64, tag = "5")]
    timestamp_ms: i64,
}

/// Serialize a chunk to its compact binary form.
#[must_use]
pub fn encode_chunk(chunk: &Chunk) -> Bytes {
    let record = ChunkRecord {
        conversation_id: chunk.conversation_id.as_str().to_owned(),
        participant_id: chunk.participant_id.as_str().to_owned(),
        sequence: chunk.sequence,
        text: chunk.text.clone(),
        timestamp_ms: chunk.timestamp_ms,
    };
    record.encode_to_vec().into()
}

/// Deserialize a durable-log record back into a chunk.
pub fn decode_chunk(value: &[u8]) -> Result<Chunk, WireError> {
    let record = ChunkRecord::decode(value)?;
    Ok(Chunk::new(
        record.conversation_id,
        record.participant_id,
        record.sequence,
        record.text,
        record.timestamp_ms,
    ))
}

//! The durable relay between live ingestion and the persisted evaluation
//! path.
//!
//! The producer side publishes every accepted chunk to the durable log with
//! bounded retries; [`IngestSession`] ties a stream of chunks to the
//! session-affine worker pool and answers with a single acknowledgment.
//! The consumer side replays the log into the message store and re-runs
//! rule evaluation independently of the live path.

pub mod consumer;
pub mod error;
pub mod ingest;
pub mod producer;

pub use consumer::RelayConsumer;
pub use error::RelayError;
pub use ingest::IngestSession;
pub use producer::{ChunkProducer, ProducerConfig};

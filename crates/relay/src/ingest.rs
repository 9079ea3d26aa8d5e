//! Stream-scoped ingestion: route each incoming chunk to its session queue
//! and answer the stream with a single acknowledgment.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use escalon_core::{Acknowledgment, Chunk};
use escalon_dispatch::{SessionTask, WorkerPool};
use escalon_rules::Analyzer;

use crate::producer::ChunkProducer;

/// Handles one ingestion stream.
///
/// Every chunk is dispatched to the worker pool under its conversation id,
/// so analysis and durable publishing for one conversation happen strictly
/// in stream order. Per-chunk failures are logged and the stream proceeds;
/// only shutdown ends a stream early.
pub struct IngestSession {
    pool: Arc<WorkerPool>,
    analyzer: Arc<Analyzer>,
    producer: Arc<ChunkProducer>,
    cancel: CancellationToken,
}

impl IngestSession {
    /// Create a session over the shared pool, analyzer, and producer.
    pub fn new(
        pool: Arc<WorkerPool>,
        analyzer: Arc<Analyzer>,
        producer: Arc<ChunkProducer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pool,
            analyzer,
            producer,
            cancel,
        }
    }

    /// Consume the stream until the sender closes it or shutdown fires,
    /// then return exactly one acknowledgment.
    ///
    /// The acknowledgment is built only after every task dispatched for
    /// this stream has finished its publish attempt, so `success: true`
    /// means the durable write of each accepted chunk was at least tried.
    /// `success` is false only when shutdown cut the stream short.
    pub async fn run(&self, mut chunks: mpsc::Receiver<Chunk>) -> Acknowledgment {
        let mut last_conversation = None;
        let mut last_sequence = None;
        let mut accepted: u64 = 0;

        // Each dispatched task carries a clone of this sender and drops it
        // when done; `recv` returns `None` once the whole stream's work has
        // finished.
        let (done_tx, mut done_rx) = mpsc::channel::<()>(1);

        let success = loop {
            let chunk = tokio::select! {
                () = self.cancel.cancelled() => break false,
                chunk = chunks.recv() => match chunk {
                    Some(chunk) => chunk,
                    None => break true,
                },
            };

            last_conversation = Some(chunk.conversation_id.clone());
            last_sequence = Some(chunk.sequence);

            let analyzer = Arc::clone(&self.analyzer);
            let producer = Arc::clone(&self.producer);
            let cancel = self.cancel.clone();
            let done = done_tx.clone();
            let key = chunk.conversation_id.as_str().to_owned();
            let task = SessionTask::new(key, async move {
                if let Err(e) = analyzer.process_chunk(&chunk).await {
                    warn!(
                        conversation_id = %chunk.conversation_id,
                        sequence = chunk.sequence,
                        error = %e,
                        "in-stream analysis failed"
                    );
                }
                // The chunk is lost to the durable path if this fails; the
                // stream itself is not interrupted.
                if let Err(e) = producer.publish(&cancel, &chunk).await {
                    warn!(
                        conversation_id = %chunk.conversation_id,
                        sequence = chunk.sequence,
                        error = %e,
                        "durable publish failed"
                    );
                }
                drop(done);
            });

            let dispatched = tokio::select! {
                () = self.cancel.cancelled() => break false,
                dispatched = self.pool.dispatch(task) => dispatched,
            };
            if dispatched.is_err() {
                break false;
            }
            accepted += 1;
        };

        // A success ack is only owed after every accepted chunk's publish
        // was attempted; a shutdown ack stays prompt instead.
        drop(done_tx);
        if success {
            let _ = done_rx.recv().await;
        }

        info!(
            accepted,
            success,
            conversation_id = ?last_conversation,
            "ingestion stream finished"
        );

        Acknowledgment {
            conversation_id: last_conversation,
            last_sequence,
            success,
            message: if success {
                format!("processed {accepted} chunks")
            } else {
                format!("interrupted after {accepted} chunks")
            },
        }
    }
}

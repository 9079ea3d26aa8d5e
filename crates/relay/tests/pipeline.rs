//! End-to-end pipeline tests wiring the memory backends together: stream
//! ingestion through the worker pool, durable publishing, and the consumer
//! replaying the log into the message store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use escalon_core::{Chunk, Condition, ConversationId, Rule, decode_chunk};
use escalon_dispatch::{DispatchConfig, WorkerPool};
use escalon_log::{DurableLog, LogCursor, LogError};
use escalon_log_memory::MemoryLog;
use escalon_log_memory::testing::FlakyLog;
use escalon_relay::{ChunkProducer, IngestSession, ProducerConfig, RelayConsumer, RelayError};
use escalon_rules::Analyzer;
use escalon_store::{MessageStore, RuleStore};
use escalon_store_memory::{MemoryMessageStore, MemoryRuleStore, RecordingSink};

fn distress_rules() -> Arc<dyn RuleStore> {
    Arc::new(MemoryRuleStore::with_rules(vec![Rule::new(
        "distress",
        vec![Condition::new("help", ">=", 3)],
        "page-oncall",
    )]))
}

fn chunk(conv: &str, seq: u64, text: &str) -> Chunk {
    Chunk::new(conv, "user-a", seq, text, 1_700_000_000_000 + seq as i64)
}

#[tokio::test]
async fn stream_flows_through_both_paths() {
    let rules = distress_rules();
    let log = Arc::new(MemoryLog::new());

    // Live path: pool + analyzer + producer behind one ingest session.
    let live_sink = Arc::new(RecordingSink::new());
    let pool = Arc::new(WorkerPool::new(DispatchConfig::default()));
    let analyzer = Arc::new(Analyzer::new(Arc::clone(&rules), live_sink.clone() as _));
    let producer = Arc::new(ChunkProducer::new(
        Arc::clone(&log) as Arc<dyn DurableLog>
    ));
    let session = IngestSession::new(
        Arc::clone(&pool),
        analyzer,
        producer,
        CancellationToken::new(),
    );

    let (tx, rx) = mpsc::channel(16);
    for (seq, text) in ["help me", "i said help", "help again please"]
        .into_iter()
        .enumerate()
    {
        tx.send(chunk("conv-1", seq as u64, text)).await.unwrap();
    }
    drop(tx);

    let ack = session.run(rx).await;
    assert!(ack.success);
    assert_eq!(ack.conversation_id, Some(ConversationId::from("conv-1")));
    assert_eq!(ack.last_sequence, Some(2));

    // All three durable writes were attempted before the ack came back.
    assert_eq!(log.record_count(), 3);
    pool.stop().await;

    // "help" reaches 3 on the third chunk, so the live path fired once.
    assert_eq!(live_sink.len(), 1);
    assert_eq!(live_sink.events()[0].action, "page-oncall");

    // Durable path: replay the closed log into the store via its own
    // analyzer; it fires again, independently of the live path.
    log.close();
    let store = Arc::new(MemoryMessageStore::new());
    let durable_sink = Arc::new(RecordingSink::new());
    let consumer = RelayConsumer::new(
        Arc::clone(&store) as Arc<dyn MessageStore>,
        Analyzer::new(rules, durable_sink.clone() as _),
    );
    let mut cursor = log.cursor("escalon");
    consumer.run(&CancellationToken::new(), &mut cursor).await;

    assert_eq!(store.message_count(&ConversationId::from("conv-1")), 3);
    assert_eq!(durable_sink.len(), 1);
    assert_eq!(durable_sink.events()[0].rule_name, "distress");
}

#[tokio::test(start_paused = true)]
async fn ack_waits_for_the_streams_publish_attempts() {
    struct SlowLog {
        inner: MemoryLog,
    }

    #[async_trait::async_trait]
    impl DurableLog for SlowLog {
        async fn write(&self, key: &[u8], value: &[u8]) -> Result<(), LogError> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.inner.write(key, value).await
        }
    }

    let log = Arc::new(SlowLog {
        inner: MemoryLog::new(),
    });
    let pool = Arc::new(WorkerPool::new(DispatchConfig::default()));
    let analyzer = Arc::new(Analyzer::new(
        distress_rules(),
        Arc::new(RecordingSink::new()) as _,
    ));
    let producer = Arc::new(ChunkProducer::new(
        Arc::clone(&log) as Arc<dyn DurableLog>
    ));
    let session = IngestSession::new(
        Arc::clone(&pool),
        analyzer,
        producer,
        CancellationToken::new(),
    );

    let (tx, rx) = mpsc::channel(4);
    tx.send(chunk("conv-1", 0, "hello")).await.unwrap();
    drop(tx);

    // The write is still in flight when the channel closes; a success ack
    // is only owed once that write attempt has finished.
    let ack = session.run(rx).await;
    assert!(ack.success);
    assert_eq!(log.inner.record_count(), 1);
    pool.stop().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_unblocks_dispatch_on_a_full_queue() {
    struct StuckLog {
        release: CancellationToken,
    }

    #[async_trait::async_trait]
    impl DurableLog for StuckLog {
        async fn write(&self, _key: &[u8], _value: &[u8]) -> Result<(), LogError> {
            self.release.cancelled().await;
            Err(LogError::Unavailable("stuck".into()))
        }
    }

    let release = CancellationToken::new();
    let cancel = CancellationToken::new();
    let pool = Arc::new(WorkerPool::new(DispatchConfig {
        workers: 1,
        queue_capacity: 1,
    }));
    let analyzer = Arc::new(Analyzer::new(
        distress_rules(),
        Arc::new(RecordingSink::new()) as _,
    ));
    let producer = Arc::new(ChunkProducer::with_config(
        Arc::new(StuckLog {
            release: release.clone(),
        }) as Arc<dyn DurableLog>,
        ProducerConfig {
            max_retries: 0,
            backoff_unit: Duration::from_millis(1),
        },
    ));
    let session = IngestSession::new(Arc::clone(&pool), analyzer, producer, cancel.clone());

    // One chunk occupies the worker (its write never finishes), one fills
    // the queue, and the third parks the session inside dispatch.
    let (tx, rx) = mpsc::channel(8);
    for seq in 0..3 {
        tx.send(chunk("conv-1", seq, "hi")).await.unwrap();
    }
    let run = tokio::spawn(async move { session.run(rx).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let ack = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancellation must unblock a dispatch parked on a full queue")
        .unwrap();
    assert!(!ack.success);

    drop(tx);
    release.cancel();
    pool.stop().await;
}

#[tokio::test]
async fn cancelled_stream_acks_failure() {
    let rules = distress_rules();
    let log = Arc::new(MemoryLog::new());
    let pool = Arc::new(WorkerPool::new(DispatchConfig::default()));
    let analyzer = Arc::new(Analyzer::new(rules, Arc::new(RecordingSink::new()) as _));
    let producer = Arc::new(ChunkProducer::new(log as Arc<dyn DurableLog>));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let session = IngestSession::new(Arc::clone(&pool), analyzer, producer, cancel);

    let (tx, rx) = mpsc::channel(4);
    tx.send(chunk("conv-1", 0, "help")).await.unwrap();

    let ack = session.run(rx).await;
    assert!(!ack.success);
    pool.stop().await;
}

#[tokio::test(start_paused = true)]
async fn exhausted_publish_does_not_poison_later_chunks() {
    // Four failures: exactly enough to exhaust one chunk's attempt budget.
    let log = Arc::new(FlakyLog::new(MemoryLog::new(), 4));
    let producer = ChunkProducer::new(Arc::clone(&log) as Arc<dyn DurableLog>);
    let cancel = CancellationToken::new();

    let err = producer
        .publish(&cancel, &chunk("conv-1", 0, "lost"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::PublishFailed { attempts: 4, .. }));

    // The next chunk publishes first try; the failed one stays lost.
    producer
        .publish(&cancel, &chunk("conv-1", 1, "kept"))
        .await
        .unwrap();
    assert_eq!(log.attempts(), 5);
    assert_eq!(log.inner().record_count(), 1);

    let mut cursor = log.inner().cursor("escalon");
    let record = cursor.next().await.unwrap();
    assert_eq!(decode_chunk(&record.value).unwrap().sequence, 1);
}

#[tokio::test]
async fn consumer_skips_malformed_records_and_continues() {
    let log = Arc::new(MemoryLog::new());
    let cancel = CancellationToken::new();
    let producer = ChunkProducer::new(Arc::clone(&log) as Arc<dyn DurableLog>);

    // A record that will never decode, then a valid chunk on the same key.
    log.write(b"conv-1", &[0xff, 0xff, 0xff, 0xff])
        .await
        .unwrap();
    producer
        .publish(&cancel, &chunk("conv-1", 0, "help help help"))
        .await
        .unwrap();
    log.close();

    let store = Arc::new(MemoryMessageStore::new());
    let sink = Arc::new(RecordingSink::new());
    let consumer = RelayConsumer::new(
        Arc::clone(&store) as Arc<dyn MessageStore>,
        Analyzer::new(distress_rules(), sink.clone() as _),
    );
    let mut cursor = log.cursor("escalon");
    consumer.run(&cancel, &mut cursor).await;

    // The garbage record is skipped; the valid one still makes it through
    // and fires the rule.
    assert_eq!(store.message_count(&ConversationId::from("conv-1")), 1);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn concurrent_producers_preserve_per_conversation_order() {
    let log = Arc::new(MemoryLog::new());
    let chunks_per_conversation = 20u64;
    let conversations = 8u32;

    let mut producers = Vec::new();
    for c in 0..conversations {
        let log = Arc::clone(&log);
        producers.push(tokio::spawn(async move {
            let producer = ChunkProducer::new(log as Arc<dyn DurableLog>);
            let cancel = CancellationToken::new();
            for seq in 0..chunks_per_conversation {
                producer
                    .publish(&cancel, &chunk(&format!("conv-{c}"), seq, "hello"))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in producers {
        handle.await.unwrap();
    }
    log.close();

    // Writes for one key share a partition, so the cursor yields each
    // conversation's chunks in publish order even though producers ran
    // concurrently.
    let mut last_seen: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
    let mut total = 0u64;
    let mut cursor = log.cursor("escalon");
    loop {
        let record = match cursor.next().await {
            Ok(record) => record,
            Err(LogError::Closed) => break,
            Err(e) => panic!("unexpected cursor error: {e}"),
        };
        let decoded = decode_chunk(&record.value).unwrap();
        let conv = decoded.conversation_id.as_str().to_owned();
        if let Some(prev) = last_seen.get(&conv) {
            assert!(
                decoded.sequence > *prev,
                "{conv} regressed from {prev} to {}",
                decoded.sequence
            );
        }
        last_seen.insert(conv, decoded.sequence);
        total += 1;
        cursor.commit(&record).await.unwrap();
    }

    assert_eq!(total, u64::from(conversations) * chunks_per_conversation);
    assert_eq!(last_seen.len(), conversations as usize);
    for (_, last) in last_seen {
        assert_eq!(last, chunks_per_conversation - 1);
    }
}

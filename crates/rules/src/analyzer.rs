//! The shared evaluation path consumed by both the low-latency dispatcher
//! and the durable-log consumer.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use escalon_core::{Chunk, EscalationEvent, WordCounts};
use escalon_store::{EscalationSink, RuleStore, StoreError};

/// Aggregates per-conversation word counts and evaluates the current rule
/// snapshot against them, firing the sink once per matching rule.
///
/// Each instance keeps its own aggregation scopes. The two pipeline paths
/// hold separate instances, so the same occurrence may be reported twice —
/// the documented at-least-once trade-off.
///
/// A conversation's counts are only ever touched by the one execution
/// context currently processing that conversation (dispatcher worker or
/// consumer loop); the map exists to hold scopes across chunks, not to
/// mediate concurrent mutation of one scope.
pub struct Analyzer {
    rules: Arc<dyn RuleStore>,
    sink: Arc<dyn EscalationSink>,
    scopes: DashMap<String, WordCounts>,
}

impl Analyzer {
    /// Create an analyzer over the given rule source and escalation sink.
    pub fn new(rules: Arc<dyn RuleStore>, sink: Arc<dyn EscalationSink>) -> Self {
        Self {
            rules,
            sink,
            scopes: DashMap::new(),
        }
    }

    /// Ingest one chunk into its conversation scope, evaluate the current
    /// rule snapshot, and report every firing rule to the sink.
    ///
    /// Returns the fired events. A rule-store failure is returned to the
    /// caller, which logs and skips this chunk; the counts ingested before
    /// the failure remain (replays double-count by design).
    pub async fn process_chunk(&self, chunk: &Chunk) -> Result<Vec<EscalationEvent>, StoreError> {
        let snapshot = {
            let mut scope = self
                .scopes
                .entry(chunk.conversation_id.as_str().to_owned())
                .or_default();
            scope.ingest(&chunk.text);
            scope.clone()
        };

        // Read-through snapshot, refetched per evaluation. No staleness
        // guarantee; changes apply from the next fetch.
        let rules = self.rules.get_all_rules().await?;

        let mut events = Vec::new();
        for rule in &rules {
            let mut actions = crate::engine::evaluate(&snapshot, std::slice::from_ref(rule));
            let Some(action) = actions.pop() else {
                continue;
            };
            let event = EscalationEvent::now(
                chunk.conversation_id.clone(),
                rule.id.clone(),
                rule.name.clone(),
                action,
            );
            if let Err(e) = self.sink.escalate(&event).await {
                warn!(
                    conversation_id = %event.conversation_id,
                    rule_id = %event.rule_id,
                    error = %e,
                    "escalation sink failed"
                );
            }
            events.push(event);
        }

        debug!(
            conversation_id = %chunk.conversation_id,
            sequence = chunk.sequence,
            rules = rules.len(),
            fired = events.len(),
            "chunk evaluated"
        );

        Ok(events)
    }

    /// Number of conversations with an active aggregation scope.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use escalon_core::{Condition, Rule};
    use escalon_store_memory::{MemoryRuleStore, RecordingSink};

    fn chunk(conv: &str, sequence: u64, text: &str) -> Chunk {
        Chunk::new(conv, "user-a", sequence, text, 0)
    }

    fn analyzer_with(rules: Vec<Rule>) -> (Analyzer, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let analyzer = Analyzer::new(
            Arc::new(MemoryRuleStore::with_rules(rules)),
            Arc::clone(&sink) as Arc<dyn EscalationSink>,
        );
        (analyzer, sink)
    }

    #[tokio::test]
    async fn fires_once_counts_cross_threshold() {
        let (analyzer, sink) = analyzer_with(vec![Rule::new(
            "distress",
            vec![Condition::new("help", ">=", 2)],
            "page",
        )]);

        let events = analyzer
            .process_chunk(&chunk("conv-1", 0, "help"))
            .await
            .unwrap();
        assert!(events.is_empty(), "one mention is below threshold");

        let events = analyzer
            .process_chunk(&chunk("conv-1", 1, "HELP!"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "page");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn scopes_are_per_conversation() {
        let (analyzer, sink) = analyzer_with(vec![Rule::new(
            "distress",
            vec![Condition::new("help", ">=", 2)],
            "page",
        )]);

        analyzer
            .process_chunk(&chunk("conv-a", 0, "help"))
            .await
            .unwrap();
        let events = analyzer
            .process_chunk(&chunk("conv-b", 0, "help"))
            .await
            .unwrap();
        assert!(events.is_empty(), "counts must not leak across scopes");
        assert!(sink.is_empty());
        assert_eq!(analyzer.scope_count(), 2);
    }

    #[tokio::test]
    async fn fires_again_once_satisfied_counts_are_cumulative() {
        // Counts never reset, so every chunk after the threshold refires.
        let (analyzer, sink) = analyzer_with(vec![Rule::new(
            "distress",
            vec![Condition::new("help", ">=", 1)],
            "page",
        )]);

        analyzer
            .process_chunk(&chunk("conv-1", 0, "help"))
            .await
            .unwrap();
        analyzer
            .process_chunk(&chunk("conv-1", 1, "anything"))
            .await
            .unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn rule_store_failure_propagates() {
        struct BrokenStore;

        #[async_trait::async_trait]
        impl RuleStore for BrokenStore {
            async fn get_all_rules(&self) -> Result<Vec<Rule>, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }

            async fn create_rule(
                &self,
                _name: &str,
                _conditions: Vec<Condition>,
                _action: &str,
            ) -> Result<Rule, StoreError> {
                Err(StoreError::Unavailable("down".into()))
            }
        }

        let sink = Arc::new(RecordingSink::new());
        let analyzer = Analyzer::new(Arc::new(BrokenStore), sink);
        let result = analyzer.process_chunk(&chunk("conv-1", 0, "help")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}

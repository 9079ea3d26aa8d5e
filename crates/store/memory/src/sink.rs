use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use escalon_core::EscalationEvent;
use escalon_store::{EscalationSink, StoreError};

/// [`EscalationSink`] that records every event, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EscalationEvent>>,
}

impl RecordingSink {
    /// Create a new, empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event delivered so far.
    #[must_use]
    pub fn events(&self) -> Vec<EscalationEvent> {
        self.events.lock().clone()
    }

    /// Number of events delivered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no event was delivered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl EscalationSink for RecordingSink {
    async fn escalate(&self, event: &EscalationEvent) -> Result<(), StoreError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// [`EscalationSink`] that reports each escalation as a structured warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl EscalationSink for LoggingSink {
    async fn escalate(&self, event: &EscalationEvent) -> Result<(), StoreError> {
        warn!(
            conversation_id = %event.conversation_id,
            rule_id = %event.rule_id,
            rule = %event.rule_name,
            action = %event.action,
            "escalation triggered"
        );
        Ok(())
    }
}

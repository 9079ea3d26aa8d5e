use async_trait::async_trait;

use escalon_core::EscalationEvent;

use crate::error::StoreError;

/// Receiver of escalation events, called once per firing rule.
///
/// The delivery mechanism (log line, webhook, queue) is the sink's concern.
/// Sinks that need exactly-once effects should deduplicate on an idempotency
/// key such as `conversation_id` + `rule_id` + a time window, since both
/// evaluation paths may report the same occurrence.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    /// Deliver one escalation event.
    async fn escalate(&self, event: &EscalationEvent) -> Result<(), StoreError>;
}

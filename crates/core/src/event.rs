use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ConversationId;

/// Emitted once per firing rule per evaluation.
///
/// Both evaluation paths (in-stream and durable replay) may produce an
/// event for the same real occurrence; deduplication, if wanted, is a sink
/// concern (e.g. idempotency key of `conversation_id` + `rule_id` + time
/// window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEvent {
    /// The conversation whose counts satisfied the rule.
    pub conversation_id: ConversationId,
    /// The identifier of the rule that fired.
    pub rule_id: String,
    /// The name of the rule that fired.
    pub rule_name: String,
    /// The action the rule maps to.
    pub action: String,
    /// When the evaluation fired the rule.
    pub triggered_at: DateTime<Utc>,
}

impl EscalationEvent {
    /// Create an event stamped with the current time.
    pub fn now(
        conversation_id: ConversationId,
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            action: action.into(),
            triggered_at: Utc::now(),
        }
    }
}

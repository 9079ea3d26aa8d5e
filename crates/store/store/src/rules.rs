use async_trait::async_trait;

use escalon_core::{Condition, Rule};

use crate::error::StoreError;

/// Operator strings accepted at rule creation time.
///
/// Evaluation itself fails closed on anything else; this list only guards
/// the authoring path so typos are caught where they can still be fixed.
pub const KNOWN_OPERATORS: [&str; 5] = [">", ">=", "==", "<", "<="];

/// Source of escalation rules.
///
/// The pipeline treats this as read-mostly: rule changes take effect on the
/// next fetch, with no in-flight invalidation guarantee. Implementations
/// must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch the current rule set as an ordered snapshot.
    async fn get_all_rules(&self) -> Result<Vec<Rule>, StoreError>;

    /// Create a new rule. The store assigns the id. Rules are replaced,
    /// never patched.
    async fn create_rule(
        &self,
        name: &str,
        conditions: Vec<Condition>,
        action: &str,
    ) -> Result<Rule, StoreError>;
}

/// Validate rule input the way the authoring API does.
///
/// Backends call this from `create_rule` so every store enforces the same
/// contract: non-empty name and action, at least one condition, and only
/// known operators.
pub fn validate_rule_input(
    name: &str,
    conditions: &[Condition],
    action: &str,
) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidRule("rule name is required".into()));
    }
    if conditions.is_empty() {
        return Err(StoreError::InvalidRule(
            "at least one condition is required".into(),
        ));
    }
    if action.is_empty() {
        return Err(StoreError::InvalidRule("rule action is required".into()));
    }
    for cond in conditions {
        if cond.word.is_empty() {
            return Err(StoreError::InvalidRule(
                "condition word is required".into(),
            ));
        }
        if !KNOWN_OPERATORS.contains(&cond.operator.as_str()) {
            return Err(StoreError::InvalidRule(format!(
                "unknown operator: {}",
                cond.operator
            )));
        }
    }
    Ok(())
}

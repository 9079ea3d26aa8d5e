use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use escalon_core::{Condition, Rule};
use escalon_store::{RuleStore, StoreError, validate_rule_input};

/// In-memory [`RuleStore`] holding rules in creation order.
///
/// Snapshots are full clones; rule changes take effect on the next fetch.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl MemoryRuleStore {
    /// Create a new, empty rule store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with rules, assigning ids to any rule
    /// that lacks one.
    #[must_use]
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| {
                if rule.id.is_empty() {
                    let id = Uuid::new_v4().to_string();
                    rule.with_id(id)
                } else {
                    rule
                }
            })
            .collect();
        Self {
            rules: RwLock::new(rules),
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get_all_rules(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self.rules.read().clone())
    }

    async fn create_rule(
        &self,
        name: &str,
        conditions: Vec<Condition>,
        action: &str,
    ) -> Result<Rule, StoreError> {
        validate_rule_input(name, &conditions, action)?;

        let rule = Rule::new(name, conditions, action).with_id(Uuid::new_v4().to_string());
        self.rules.write().push(rule.clone());
        Ok(rule)
    }
}

use serde::{Deserialize, Serialize};

/// A single word-count threshold check, e.g. "count of `help` >= 3".
///
/// The operator is kept as the raw string stored by the rule source. An
/// unrecognized operator makes the condition evaluate false at match time
/// (fail closed) rather than failing deserialization of the whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// The normalized word whose count is checked.
    pub word: String,
    /// One of `>`, `>=`, `==`, `<`, `<=`.
    pub operator: String,
    /// The count the word's tally is compared against.
    pub threshold: i64,
}

impl Condition {
    /// Create a new condition.
    pub fn new(word: impl Into<String>, operator: impl Into<String>, threshold: i64) -> Self {
        Self {
            word: word.into(),
            operator: operator.into(),
            threshold,
        }
    }
}

/// An escalation rule: an AND-combined set of conditions mapped to one
/// action name.
///
/// A rule fires only when every condition holds against the current word
/// counts; a rule with zero conditions never fires. Rules are replaced, not
/// patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Opaque identifier assigned by the rule store.
    pub id: String,
    /// A human-readable name for the rule.
    pub name: String,
    /// Conditions combined with AND semantics, evaluated in order.
    pub conditions: Vec<Condition>,
    /// The action name emitted when the rule fires, e.g. `"log"`,
    /// `"webhook"`.
    pub action: String,
}

impl Rule {
    /// Create a new rule with an empty id. The rule store assigns ids on
    /// creation.
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<Condition>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            conditions,
            action: action.into(),
        }
    }

    /// Set the identifier of this rule.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_construction() {
        let rule = Rule::new(
            "distress",
            vec![Condition::new("help", ">=", 2)],
            "page-oncall",
        )
        .with_id("rule-1");

        assert_eq!(rule.id, "rule-1");
        assert_eq!(rule.name, "distress");
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.action, "page-oncall");
    }

    #[test]
    fn rule_serde_roundtrip() {
        let rule = Rule::new(
            "multi",
            vec![
                Condition::new("help", ">=", 2),
                Condition::new("please", ">", 0),
            ],
            "log",
        )
        .with_id("rule-2");

        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn condition_keeps_raw_operator() {
        // Unknown operators survive deserialization; they fail closed later.
        let json = r#"{"word":"help","operator":"~=","threshold":1}"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(cond.operator, "~=");
    }
}

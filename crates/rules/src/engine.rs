//! Pure rule evaluation against an aggregated word-count snapshot.

use tracing::warn;

use escalon_core::{Rule, WordCounts};

/// A recognized comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Ge,
    Eq,
    Lt,
    Le,
}

impl Operator {
    /// Parse a stored operator string. Returns `None` for anything
    /// unrecognized; the caller fails that condition closed.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }

    /// Compare an observed count against a threshold.
    #[must_use]
    pub fn compare(self, count: i64, threshold: i64) -> bool {
        match self {
            Self::Gt => count > threshold,
            Self::Ge => count >= threshold,
            Self::Eq => count == threshold,
            Self::Lt => count < threshold,
            Self::Le => count <= threshold,
        }
    }
}

/// Evaluate `rules` against `counts`, returning the action of every firing
/// rule in rule order.
///
/// Conditions within a rule are AND-combined and short-circuit on the first
/// false. The count of an absent word is zero. An unrecognized operator
/// makes that single condition false (fail closed) without aborting the
/// evaluation of other rules. A rule with zero conditions never fires, and
/// a rule fires at most once per call. Inputs are not mutated.
#[must_use]
pub fn evaluate(counts: &WordCounts, rules: &[Rule]) -> Vec<String> {
    let mut actions = Vec::new();

    for rule in rules {
        if rule.conditions.is_empty() {
            continue;
        }

        let fired = rule.conditions.iter().all(|cond| {
            let Some(op) = Operator::parse(&cond.operator) else {
                warn!(
                    rule_id = %rule.id,
                    operator = %cond.operator,
                    "unrecognized operator, condition fails closed"
                );
                return false;
            };
            let count = i64::try_from(counts.count(&cond.word)).unwrap_or(i64::MAX);
            op.compare(count, cond.threshold)
        });

        if fired {
            actions.push(rule.action.clone());
        }
    }

    actions
}

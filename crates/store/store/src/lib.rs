pub mod error;
pub mod rules;
pub mod sink;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use rules::{KNOWN_OPERATORS, RuleStore, validate_rule_input};
pub use sink::EscalationSink;
pub use store::MessageStore;

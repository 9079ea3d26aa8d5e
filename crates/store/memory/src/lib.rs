mod rules;
mod sink;
mod store;

pub use rules::MemoryRuleStore;
pub use sink::{LoggingSink, RecordingSink};
pub use store::MemoryMessageStore;

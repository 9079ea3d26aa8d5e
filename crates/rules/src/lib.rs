pub mod analyzer;
pub mod engine;

pub use analyzer::Analyzer;
pub use engine::{Operator, evaluate};

pub mod error;
pub mod log;
pub mod testing;

pub use error::LogError;
pub use log::{DurableLog, LogCursor, Record};

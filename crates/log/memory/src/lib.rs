mod log;
pub mod testing;

pub use log::{MemoryCursor, MemoryLog};

pub mod hash;
pub mod pool;

pub use hash::{Fnv1a, SessionHasher};
pub use pool::{DispatchConfig, DispatchError, SessionTask, WorkerPool};

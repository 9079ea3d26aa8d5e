use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::hash::{Fnv1a, SessionHasher};

/// Configuration for a [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of workers, fixed at construction. Independent of the number
    /// of sessions.
    pub workers: usize,
    /// Pending-task capacity of each worker's queue. A full queue blocks
    /// `dispatch` (back-pressure) rather than dropping work.
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 100,
        }
    }
}

/// Errors surfaced by [`WorkerPool::dispatch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The pool was stopped; no new tasks are accepted.
    #[error("worker pool is shut down")]
    Shutdown,
}

/// One unit of work for a session.
///
/// The pool knows nothing about what the job does; it only guarantees
/// ordering and isolation per `session_key`.
pub struct SessionTask {
    session_key: String,
    job: BoxFuture<'static, ()>,
}

impl SessionTask {
    /// Create a task for `session_key` running `job`.
    pub fn new(
        session_key: impl Into<String>,
        job: impl Future<Output = ()> + Send + 'static,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            job: job.boxed(),
        }
    }

    /// The session this task belongs to.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }
}

impl std::fmt::Debug for SessionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTask")
            .field("session_key", &self.session_key)
            .finish_non_exhaustive()
    }
}

/// Fixed pool of workers, each consuming one strictly-FIFO bounded queue.
///
/// A session key is mapped deterministically to one queue via
/// `hash(key) mod workers`, so tasks for the same session execute in
/// enqueue order and never concurrently with each other, while tasks for
/// different sessions run in parallel, up to `workers` at once.
pub struct WorkerPool {
    queues: RwLock<Option<Vec<mpsc::Sender<SessionTask>>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    hasher: Arc<dyn SessionHasher>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn a pool with the default FNV-1a session hash.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_hasher(config, Arc::new(Fnv1a))
    }

    /// Spawn a pool with a custom session hash.
    #[must_use]
    pub fn with_hasher(config: DispatchConfig, hasher: Arc<dyn SessionHasher>) -> Self {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let mut queues = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, rx) = mpsc::channel(capacity);
            queues.push(tx);
            handles.push(tokio::spawn(worker_loop(worker_id, rx)));
        }

        Self {
            queues: RwLock::new(Some(queues)),
            handles: Mutex::new(handles),
            hasher,
            workers,
        }
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// The queue index a session key maps to. Stable for the pool's
    /// lifetime.
    #[must_use]
    pub fn queue_index(&self, session_key: &str) -> usize {
        usize::try_from(self.hasher.hash_key(session_key) % self.workers as u64).unwrap_or(0)
    }

    /// Enqueue a task on its session's queue.
    ///
    /// Returns immediately unless that queue is at capacity, in which case
    /// the call suspends until space frees up — back-pressure, never a
    /// drop. Fails only after [`stop`](Self::stop).
    pub async fn dispatch(&self, task: SessionTask) -> Result<(), DispatchError> {
        let idx = self.queue_index(task.session_key());
        let tx = {
            let queues = self.queues.read();
            queues
                .as_ref()
                .and_then(|q| q.get(idx).cloned())
                .ok_or(DispatchError::Shutdown)?
        };
        tx.send(task).await.map_err(|_| DispatchError::Shutdown)
    }

    /// Close all queues for new input, let every worker drain its remaining
    /// queued tasks, then return. No task is dropped during an orderly
    /// shutdown. Subsequent `dispatch` calls fail with
    /// [`DispatchError::Shutdown`].
    pub async fn stop(&self) {
        // Dropping the senders closes the queues; workers exit once drained.
        self.queues.write().take();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task failed to join");
            }
        }
    }
}

async fn worker_loop(worker_id: usize, mut rx: mpsc::Receiver<SessionTask>) {
    debug!(worker_id, "worker started");
    while let Some(task) = rx.recv().await {
        let session_key = task.session_key;
        // A panicking job must not kill the worker or stall the queue.
        if let Err(panic) = std::panic::AssertUnwindSafe(task.job)
            .catch_unwind()
            .await
        {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            error!(worker_id, session_key = %session_key, panic = %reason, "task panicked");
        }
    }
    debug!(worker_id, "worker drained and stopped");
}

//! Bounded worker pool backing deferred work
//!
//! Wraps a multi-threaded tokio runtime with a fixed number of worker
//! threads and a capped blocking pool. Nothing in ocres spawns a thread per
//! request; deferred reads, delivery streams and background updates all run
//! here.

use parking_lot::Mutex;
use resource_model::{ResourceError, Result};
use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

pub struct WorkerPool {
    name: String,
    runtime: Mutex<Option<Runtime>>,
}

impl WorkerPool {
    /// Build a pool with `worker_threads` async workers and at most
    /// `max_blocking_threads` blocking threads
    pub fn new(name: &str, worker_threads: usize, max_blocking_threads: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .max_blocking_threads(max_blocking_threads.max(1))
            .thread_name(format!("{}-worker", name))
            .enable_all()
            .build()
            .map_err(|e| {
                tracing::error!("Failed to create tokio runtime for {}: {}", name, e);
                ResourceError::Internal(format!("failed to start {} workers: {}", name, e))
            })?;

        tracing::debug!(
            "Started {} pool ({} workers, {} blocking)",
            name,
            worker_threads.max(1),
            max_blocking_threads.max(1)
        );

        Ok(Self {
            name: name.to_string(),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for spawning onto the pool; `None` after shutdown
    pub fn handle(&self) -> Option<Handle> {
        self.runtime.lock().as_ref().map(|rt| rt.handle().clone())
    }

    /// Run blocking work on the capped blocking pool
    pub fn spawn_blocking<F, R>(&self, work: F) -> Result<JoinHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime
            .lock()
            .as_ref()
            .map(|rt| rt.spawn_blocking(work))
            .ok_or_else(|| self.stopped())
    }

    /// Run a task on the async workers
    pub fn spawn<F>(&self, task: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime
            .lock()
            .as_ref()
            .map(|rt| rt.spawn(task))
            .ok_or_else(|| self.stopped())
    }

    pub fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }

    /// Stop accepting work and let running tasks wind down in the background
    pub fn shutdown(&self) {
        let runtime = self.runtime.lock().take();
        if let Some(runtime) = runtime {
            tracing::debug!("Shutting down {} pool", self.name);
            runtime.shutdown_background();
        }
    }

    fn stopped(&self) -> ResourceError {
        ResourceError::NotFound(format!("{} pool has shut down", self.name))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_spawn_blocking_runs_work() {
        let pool = WorkerPool::new("test", 1, 2).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.spawn_blocking(move || tx.send(42).unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 42);
    }

    #[test]
    fn test_spawn_after_shutdown_fails() {
        let pool = WorkerPool::new("test", 1, 1).unwrap();
        pool.shutdown();

        assert!(!pool.is_running());
        assert!(pool.handle().is_none());
        assert!(matches!(
            pool.spawn_blocking(|| ()),
            Err(ResourceError::NotFound(_))
        ));
    }
}

//! Bounded pool for password derivation
//!
//! PBKDF2 with 65536 rounds is deliberately slow. Running it inline on the
//! async executor would stall every other request, and running an unbounded
//! number of them at once would exhaust the CPU. `HashingPool` moves each
//! job onto tokio's blocking threads, caps how many run at the same time,
//! and turns callers away once the wait queue is full.

use crate::error::AuthError;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded executor for CPU-heavy hashing jobs
#[derive(Debug, Clone)]
pub struct HashingPool {
    /// One permit per job allowed to run
    workers: Arc<Semaphore>,
    /// One permit per job allowed to run or wait
    admission: Arc<Semaphore>,
    worker_count: usize,
}

impl HashingPool {
    /// Create a pool running at most `workers` jobs, with `queue_depth` more waiting
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(workers + queue_depth)),
            worker_count: workers,
        }
    }

    /// Run `job` on a blocking thread once a worker slot is free
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The job's result
    /// * `Err(AuthError::Overloaded)` - Every worker is busy and the queue is full
    /// * `Err(AuthError::Internal)` - The job panicked
    pub async fn run<F, T>(&self, job: F) -> Result<T, AuthError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let admitted = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| {
                tracing::warn!(
                    workers = self.worker_count,
                    "Hashing pool saturated, rejecting request"
                );
                AuthError::Overloaded
            })?;

        let worker = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| AuthError::Internal("hashing pool closed".to_string()))?;

        // Permits travel with the job so they are held until it really finishes,
        // even if the awaiting caller is dropped.
        tokio::task::spawn_blocking(move || {
            let _worker = worker;
            let _admitted = admitted;
            job()
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))
    }

    /// Maximum number of jobs running at once
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Worker slots free right now
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_job() {
        let pool = HashingPool::new(2, 2);
        let value = pool.run(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.idle_workers(), 2);
    }

    #[tokio::test]
    async fn test_zero_workers_clamped() {
        let pool = HashingPool::new(0, 0);
        assert_eq!(pool.worker_count(), 1);
        assert_eq!(pool.run(|| "ok").await.unwrap(), "ok");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejects_when_saturated() {
        let pool = HashingPool::new(1, 0);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let busy = {
            let pool = pool.clone();
            tokio::spawn(async move {
                pool.run(move || {
                    let _ = started_tx.send(());
                    let _ = release_rx.recv_timeout(Duration::from_secs(10));
                })
                .await
            })
        };

        started_rx.await.unwrap();
        assert_eq!(pool.run(|| ()).await, Err(AuthError::Overloaded));

        release_tx.send(()).unwrap();
        busy.await.unwrap().unwrap();
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let pool = HashingPool::new(1, 0);
        let result = pool.run(|| -> u8 { panic!("boom") }).await;
        assert!(matches!(result, Err(AuthError::Internal(_))));

        // the slot is handed back after the panic
        assert_eq!(pool.run(|| 7).await.unwrap(), 7);
    }
}

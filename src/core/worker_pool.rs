use crate::utils::progress::Progress;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_WORKERS: usize = 20;

/// Runs independent tasks with at most `workers` in flight at a time.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `task` for every item and returns the outputs in completion order,
    /// which is not the input order. A task that panics is logged and skipped.
    pub async fn run<I, T, F, Fut>(&self, label: &'static str, items: Vec<I>, task: F) -> Vec<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut progress = Progress::new(label, items.len());
        let mut tasks = JoinSet::new();

        for item in items {
            let semaphore = semaphore.clone();
            let work = task(item);
            tasks.spawn(async move {
                // the semaphore is never closed, so this only waits for a free slot
                let _permit = semaphore.acquire_owned().await.ok();
                work.await
            });
        }

        let mut outputs = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            progress.tick();
            match joined {
                Ok(output) => outputs.push(output),
                Err(e) => tracing::error!("❌ {} worker failed: {}", label, e),
            }
        }
        progress.finish();

        outputs
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

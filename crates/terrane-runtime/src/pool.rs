use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::{Task, WorkQueue};

/// Runs tasks on a dedicated rayon pool and hands results back through a
/// channel.
pub struct WorkerPool<T> {
    pool: ThreadPool,
    res_tx: Sender<T>,
    res_rx: Receiver<T>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    workers: usize,
}

// Keeps the counters right when a task panics.
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// `workers == 0` picks one per available core.
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let workers = if workers == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            workers
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("terrane-worker-{i}"))
            .panic_handler(|payload| {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!(target: "runtime", "worker task panicked: {}", msg);
            })
            .build()?;
        let (res_tx, res_rx) = unbounded::<T>();
        log::info!(target: "runtime", "worker pool started with {} threads", workers);
        Ok(Self {
            pool,
            res_tx,
            res_rx,
            queued: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl<T: Send + 'static> WorkQueue<T> for WorkerPool<T> {
    fn submit(&self, task: Task<T>) {
        let tx = self.res_tx.clone();
        let queued = self.queued.clone();
        let running = self.running.clone();
        queued.fetch_add(1, Ordering::Relaxed);
        self.pool.spawn(move || {
            running.fetch_add(1, Ordering::Relaxed);
            queued.fetch_sub(1, Ordering::Relaxed);
            let _guard = RunningGuard(running);
            let out = task();
            // the receiver lives as long as the pool
            let _ = tx.send(out);
        });
    }

    fn drain_completed(&self) -> Vec<T> {
        self.res_rx.try_iter().collect()
    }

    fn in_flight(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
            + self.running.load(Ordering::Relaxed)
            + self.res_rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain_until<T: Send + 'static>(pool: &WorkerPool<T>, want: usize) -> Vec<T> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut out = Vec::new();
        while out.len() < want && Instant::now() < deadline {
            out.extend(pool.drain_completed());
            thread::sleep(Duration::from_millis(1));
        }
        out
    }

    fn wait_idle<T: Send + 'static>(pool: &WorkerPool<T>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while pool.in_flight() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn runs_every_task_once() {
        let pool: WorkerPool<u32> = WorkerPool::new(3).unwrap();
        for i in 0..64u32 {
            pool.submit(Box::new(move || i * 2));
        }
        let mut out = drain_until(&pool, 64);
        out.sort_unstable();
        assert_eq!(out, (0..64u32).map(|i| i * 2).collect::<Vec<_>>());
        wait_idle(&pool);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn zero_workers_means_one_per_core() {
        let pool: WorkerPool<u8> = WorkerPool::new(0).unwrap();
        assert!(pool.workers() >= 1);
        assert_eq!(WorkerPool::<u8>::new(2).unwrap().workers(), 2);
    }

    #[test]
    fn workers_are_named() {
        let pool: WorkerPool<Option<String>> = WorkerPool::new(1).unwrap();
        pool.submit(Box::new(|| thread::current().name().map(str::to_string)));
        let out = drain_until(&pool, 1);
        assert_eq!(out, vec![Some("terrane-worker-0".to_string())]);
    }

    #[test]
    fn panicking_task_does_not_leak_in_flight() {
        let pool = WorkerPool::<u8>::new(1).unwrap();
        pool.submit(Box::new(|| -> u8 { panic!("boom") }));
        pool.submit(Box::new(|| 7));
        let out = drain_until(&pool, 1);
        assert_eq!(out, vec![7]);
        wait_idle(&pool);
        assert_eq!(pool.in_flight(), 0);
    }
}

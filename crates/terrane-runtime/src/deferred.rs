use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Task, WorkQueue};

/// Holds tasks until the owner runs them. Lets single-threaded hosts and
/// tests decide exactly when results arrive.
pub struct DeferredQueue<T> {
    pending: Mutex<VecDeque<Task<T>>>,
    completed: Mutex<Vec<T>>,
    submitted: AtomicUsize,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            completed: Mutex::new(Vec::new()),
            submitted: AtomicUsize::new(0),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total submissions since creation.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Runs the oldest pending task. Returns false when nothing was pending.
    pub fn run_next(&self) -> bool {
        let task = lock(&self.pending).pop_front();
        match task {
            Some(task) => {
                let out = task();
                lock(&self.completed).push(out);
                true
            }
            None => false,
        }
    }

    /// Runs pending tasks until none are left, including any submitted while
    /// running. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Drops every pending task without running it.
    pub fn discard_pending(&self) -> usize {
        let mut pending = lock(&self.pending);
        let n = pending.len();
        pending.clear();
        n
    }
}

fn lock<V>(m: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T> WorkQueue<T> for DeferredQueue<T> {
    fn submit(&self, task: Task<T>) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        lock(&self.pending).push_back(task);
    }

    fn drain_completed(&self) -> Vec<T> {
        std::mem::take(&mut *lock(&self.completed))
    }

    fn in_flight(&self) -> usize {
        lock(&self.pending).len() + lock(&self.completed).len()
    }
}

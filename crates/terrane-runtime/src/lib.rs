//! Background job queues. Jobs are pure closures; results are collected by
//! whoever owns the queue, on its own thread.
#![forbid(unsafe_code)]

mod deferred;
mod pool;

pub use deferred::DeferredQueue;
pub use pool::WorkerPool;
pub use rayon::ThreadPoolBuildError;

/// A unit of background work producing one `T`.
pub type Task<T> = Box<dyn FnOnce() -> T + Send + 'static>;

/// Fire-and-forget job queue. There is no cancellation and no ordering
/// guarantee between submissions; callers that outlive their interest in a
/// result must recognise and drop it themselves.
pub trait WorkQueue<T> {
    fn submit(&self, task: Task<T>);

    /// Every result finished since the last call, without blocking.
    fn drain_completed(&self) -> Vec<T>;

    /// Submitted tasks whose result has not yet been drained.
    fn in_flight(&self) -> usize;
}

impl<T, Q: WorkQueue<T> + ?Sized> WorkQueue<T> for &Q {
    fn submit(&self, task: Task<T>) {
        (**self).submit(task)
    }

    fn drain_completed(&self) -> Vec<T> {
        (**self).drain_completed()
    }

    fn in_flight(&self) -> usize {
        (**self).in_flight()
    }
}

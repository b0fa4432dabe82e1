//! A bounded worker pool with a `parallel_for` primitive.
//!
//! The pool owns a fixed set of OS threads sharing a FIFO queue guarded by
//! a mutex and a "not empty" condition. Each worker blocks on the condition
//! and executes one task at a time. Submitting returns a [`TaskHandle`]
//! whose `wait` spins on a ready flag set after the closure returns.
//!
//! The pool is an explicit value: algorithms that parallelize take
//! `&ThreadPool` from the caller, so tests control worker lifetimes and no
//! process-wide singleton exists.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

mod task;

pub use task::TaskHandle;
use task::Task;

/// State behind the queue mutex.
struct Queue {
    /// Tasks waiting for a worker, oldest first.
    tasks: VecDeque<Task>,
    /// Set once, at shutdown; workers drain and exit.
    stop: bool,
    /// Workers currently idle on the condition.
    free: usize,
    /// Idle workers not yet earmarked by `add_task_if_free`.
    reserve: usize,
}

/// The queue and its condition, shared between the pool and its workers.
struct Shared {
    /// The guarded queue state.
    queue: Mutex<Queue>,
    /// Signalled when a task is pushed or the pool stops.
    not_empty: Condvar,
}

impl Shared {
    /// Blocks until a task is available or the pool is stopping. Returns
    /// `None` on stop.
    fn next_task(&self) -> Option<Task> {
        let mut state = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        state.free += 1;
        state.reserve += 1;
        while state.tasks.is_empty() && !state.stop {
            state = self.not_empty.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.stop {
            return None;
        }
        let task = state.tasks.pop_front();
        if task.is_some() {
            if state.reserve == state.free {
                state.reserve -= 1;
            }
            state.free -= 1;
        }
        task
    }
}

/// A fixed-size worker pool.
///
/// Dropping the pool sets the stop flag, wakes every worker, joins them,
/// and discards any tasks still queued.
pub struct ThreadPool {
    /// State shared with the workers.
    shared: Arc<Shared>,
    /// Join handles for the worker threads.
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadPool {
    /// Pool size used when the hardware concurrency cannot be determined.
    pub const DEFAULT_WORKERS: usize = 4;

    /// Creates a pool sized to the hardware concurrency, falling back to
    /// [`DEFAULT_WORKERS`](Self::DEFAULT_WORKERS).
    #[must_use]
    pub fn new() -> Self {
        let workers = thread::available_parallelism().map_or(Self::DEFAULT_WORKERS, std::num::NonZeroUsize::get);
        Self::with_workers(workers)
    }

    /// Creates a pool with an explicit number of workers (at least one).
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                stop: false,
                free: 0,
                reserve: 0,
            }),
            not_empty: Condvar::new(),
        });
        let workers = (0..workers.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    while let Some(task) = shared.next_task() {
                        task.execute();
                    }
                })
            })
            .collect();
        Self { shared, workers }
    }

    /// The number of workers in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Enqueues a task and returns a handle to await it.
    pub fn add_task<F: FnOnce() + Send + 'static>(&self, job: F) -> TaskHandle {
        let (task, handle) = Task::new(Box::new(job));
        {
            let mut state = self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
            state.tasks.push_back(task);
        }
        self.shared.not_empty.notify_one();
        handle
    }

    /// Enqueues a task only if an idle worker is available for it right
    /// now; otherwise returns `None` and the closure is dropped.
    pub fn add_task_if_free<F: FnOnce() + Send + 'static>(&self, job: F) -> Option<TaskHandle> {
        let mut state = self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if state.reserve == 0 {
            return None;
        }
        let (task, handle) = Task::new(Box::new(job));
        state.tasks.push_back(task);
        state.reserve -= 1;
        self.shared.not_empty.notify_one();
        Some(handle)
    }

    /// Applies `body` to contiguous chunks of `range`, using the pool.
    ///
    /// The range is sliced into approximately `workers + 1` chunks;
    /// `workers` chunks are submitted to the pool and the final chunk runs
    /// on the calling thread, which then joins every handle. Chunking is a
    /// pure function of the range and the pool size, so runs are
    /// repeatable.
    ///
    /// # Panics
    ///
    /// A panic in any chunk is captured and rethrown here once every other
    /// chunk has finished.
    pub fn parallel_for<F>(&self, range: Range<usize>, body: F)
    where
        F: Fn(Range<usize>) + Send + Sync,
    {
        let total = range.end.saturating_sub(range.start);
        if total == 0 {
            return;
        }
        let chunks = (self.size() + 1).min(total);
        if chunks == 1 {
            body(range);
            return;
        }

        let base = total / chunks;
        let extra = total % chunks;
        let mut ranges = Vec::with_capacity(chunks);
        let mut start = range.start;
        for i in 0..chunks {
            let end = start + base + usize::from(i < extra);
            ranges.push(start..end);
            start = end;
        }
        let tail = ranges.pop().unwrap_or(range);

        // SAFETY: every submitted task is awaited before this function
        // returns; `JoinGuard` waits even when the caller's own chunk
        // unwinds. No worker can observe `body` after it is dropped.
        #[allow(unsafe_code)]
        let body_ref: &'static (dyn Fn(Range<usize>) + Send + Sync) = unsafe {
            core::mem::transmute::<&(dyn Fn(Range<usize>) + Send + Sync), &'static (dyn Fn(Range<usize>) + Send + Sync)>(
                &body,
            )
        };

        let handles = ranges
            .into_iter()
            .map(|chunk| self.add_task(move || body_ref(chunk)))
            .collect::<Vec<_>>();
        let guard = JoinGuard(&handles);

        body(tail);

        for handle in &handles {
            handle.wait();
        }
        drop(guard);
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
            state.stop = true;
        }
        self.shared.not_empty.notify_all();
        for worker in self.workers.drain(..) {
            // A worker that panicked through `execute` cannot happen (panics
            // are captured), so a join error is ignored.
            drop(worker.join());
        }
    }
}

/// Awaits the submitted chunks of a `parallel_for` even when the calling
/// thread unwinds, so borrowed state stays alive for the workers.
struct JoinGuard<'a>(&'a [TaskHandle]);

impl Drop for JoinGuard<'_> {
    fn drop(&mut self) {
        for handle in self.0 {
            handle.wait_ready();
        }
    }
}

/// A raw window over a slice for disjoint-index writes from `parallel_for`
/// chunks. The caller promises that no index is written by more than one
/// task and that the slice outlives the `parallel_for` call.
pub(crate) struct SharedCells<T>(*mut T);

#[allow(unsafe_code)]
// SAFETY: the cells are only used under the disjoint-index contract above,
// which makes concurrent writes race-free.
unsafe impl<T: Send> Send for SharedCells<T> {}
#[allow(unsafe_code)]
// SAFETY: as for `Send`.
unsafe impl<T: Send> Sync for SharedCells<T> {}

impl<T> SharedCells<T> {
    /// Wraps a slice for disjoint-index parallel writes.
    pub(crate) fn new(slice: &mut [T]) -> Self {
        Self(slice.as_mut_ptr())
    }

    /// Writes `value` at `index`.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds of the wrapped slice and written by at
    /// most one task per `parallel_for` call.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn write(&self, index: usize, value: T) {
        // SAFETY: in-bounds and uniquely owned per the function contract.
        unsafe {
            *self.0.add(index) = value;
        }
    }
}

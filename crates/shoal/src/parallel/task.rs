//! Tasks and the handles used to await them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// The closure form accepted by the pool.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// A queued unit of work, owned by the pool until a worker executes it.
pub(crate) struct Task {
    /// The closure to run.
    job: Job,
    /// The completion state shared with the caller's handle.
    state: Arc<TaskState>,
}

/// Completion state shared between a [`Task`] and its [`TaskHandle`].
struct TaskState {
    /// Flagged after the closure returns (or unwinds).
    ready: AtomicBool,
    /// A panic payload captured from the worker, if any.
    panic: Mutex<Option<Box<dyn Any + Send + 'static>>>,
}

impl Task {
    /// Pairs a closure with the handle that will observe its completion.
    pub(crate) fn new(job: Job) -> (Self, TaskHandle) {
        let state = Arc::new(TaskState {
            ready: AtomicBool::new(false),
            panic: Mutex::new(None),
        });
        let handle = TaskHandle { state: Arc::clone(&state) };
        (Self { job, state }, handle)
    }

    /// Runs the closure, capturing a panic instead of unwinding through the
    /// worker, then flags the handle as ready.
    pub(crate) fn execute(self) {
        let Self { job, state } = self;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let mut slot = state.panic.lock().unwrap_or_else(PoisonError::into_inner);
            *slot = Some(payload);
        }
        state.ready.store(true, Ordering::Release);
    }
}

/// Awaits the completion of a task submitted to a
/// [`ThreadPool`](super::ThreadPool).
pub struct TaskHandle {
    /// The completion state shared with the queued task.
    state: Arc<TaskState>,
}

impl TaskHandle {
    /// Whether the task has finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.ready.load(Ordering::Acquire)
    }

    /// Blocks until the task has finished.
    ///
    /// A task still queued when its pool is dropped is discarded and never
    /// becomes ready; do not wait on handles after dropping the pool.
    ///
    /// # Panics
    ///
    /// If the task's closure panicked on its worker, the captured payload is
    /// rethrown here, on the waiting thread.
    pub fn wait(&self) {
        self.wait_ready();
        let payload = {
            let mut slot = self.state.panic.lock().unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        if let Some(payload) = payload {
            panic::resume_unwind(payload);
        }
    }

    /// Spins until the ready flag is set, without rethrowing panics.
    pub(crate) fn wait_ready(&self) {
        let mut spins = 0_u32;
        while !self.state.ready.load(Ordering::Acquire) {
            spins = spins.wrapping_add(1);
            if spins % 64 == 0 {
                std::thread::yield_now();
            } else {
                core::hint::spin_loop();
            }
        }
    }
}

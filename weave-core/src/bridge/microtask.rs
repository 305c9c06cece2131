//! Microtask queue.
//!
//! The deferral point the batching scheduler flushes on: callbacks enqueued
//! here run after the current synchronous stretch of work, when the
//! embedding event loop (or a test) calls [`MicrotaskQueue::run_until_idle`].
//! Tasks enqueued while draining run in the same drain, after everything
//! already queued.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

type Task = Box<dyn FnOnce()>;

/// A FIFO of deferred callbacks. Clones share the same queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl MicrotaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `task` to the end of the current synchronous window.
    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run queued tasks until none are left. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop before running: tasks may enqueue more.
            let next = self.tasks.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            trace!(ran, "microtasks drained");
        }
        ran
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("len", &self.len())
            .finish()
    }
}

//! Batching Scheduler
//!
//! Collects re-render jobs and runs each of them once per microtask turn.
//!
//! # Algorithm
//!
//! 1. `schedule(job)` inserts the job into the pending set. Jobs compare by
//!    identity, so a computation triggered N times before the flush is
//!    queued once.
//! 2. The first insert of a batch enqueues exactly one flush on the
//!    microtask queue.
//! 3. The flush takes the pending set, replacing it with an empty one, and
//!    clears the "flush scheduled" flag *before* running anything. Jobs
//!    scheduled while it runs land in the fresh set and get a flush of their
//!    own: they run in the next batch, never in the one being iterated.
//! 4. Jobs run in first-insertion order.
//!
//! There is no priority and no cancellation. A job for a disposed effect is
//! still run and is expected to notice disposal on its own.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use tracing::trace;

use super::microtask::MicrotaskQueue;
use crate::reactive::{Job, SchedulerHook};

struct SchedulerInner {
    pending: RefCell<IndexSet<Job>>,
    flush_scheduled: Cell<bool>,
    flush_count: Cell<usize>,
    microtasks: MicrotaskQueue,
}

impl SchedulerInner {
    fn flush(&self) {
        let jobs = std::mem::take(&mut *self.pending.borrow_mut());
        self.flush_scheduled.set(false);
        self.flush_count.set(self.flush_count.get() + 1);
        trace!(jobs = jobs.len(), flush = self.flush_count.get(), "flushing batch");

        for job in &jobs {
            job.run();
        }
    }
}

/// A batching job scheduler bound to one microtask queue.
///
/// Clones share the same pending set. Independent render roots that must
/// not batch together get independent schedulers.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler that flushes on `microtasks`.
    pub fn new(microtasks: MicrotaskQueue) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                pending: RefCell::new(IndexSet::new()),
                flush_scheduled: Cell::new(false),
                flush_count: Cell::new(0),
                microtasks,
            }),
        }
    }

    /// Create a scheduler with a private microtask queue.
    pub fn isolated() -> Self {
        Self::new(MicrotaskQueue::new())
    }

    /// Queue `job` for the next flush.
    pub fn schedule(&self, job: Job) {
        let inserted = self.inner.pending.borrow_mut().insert(job);
        trace!(inserted, pending = self.pending_len(), "job scheduled");

        if !self.inner.flush_scheduled.replace(true) {
            let weak: Weak<SchedulerInner> = Rc::downgrade(&self.inner);
            self.inner.microtasks.enqueue(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.flush();
                }
            });
        }
    }

    /// This scheduler as an effect scheduler hook.
    pub fn hook(&self) -> SchedulerHook {
        let scheduler = self.clone();
        Rc::new(move |job: Job| scheduler.schedule(job))
    }

    /// The microtask queue flushes are deferred to.
    pub fn microtasks(&self) -> &MicrotaskQueue {
        &self.inner.microtasks
    }

    /// Drain the microtask queue, running every pending flush.
    pub fn run_until_idle(&self) -> usize {
        self.inner.microtasks.run_until_idle()
    }

    /// Number of jobs waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// True between the first schedule of a batch and its flush.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.flush_scheduled.get()
    }

    /// Number of flushes run so far.
    pub fn flush_count(&self) -> usize {
        self.inner.flush_count.get()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::isolated()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_len())
            .field("flush_scheduled", &self.is_flush_scheduled())
            .field("flush_count", &self.flush_count())
            .finish()
    }
}

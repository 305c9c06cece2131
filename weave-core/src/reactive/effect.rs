//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is triggered. Without a
//!    scheduler it re-runs on the spot; with one, it hands its [`Job`] to the
//!    scheduler and lets it decide when.
//!
//! 3. Before re-running, the effect drops its old dependencies and tracks
//!    new ones during execution.
//!
//! 4. Once stopped, the effect never runs again. Stale jobs that are still
//!    queued somewhere become no-ops.
//!
//! # Hooks
//!
//! [`EffectHooks`] lets callers observe tracking (`on_track`), triggering
//! (`on_trigger`) and stopping (`on_stop`). They are debugging aids and do
//! not influence scheduling.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::runtime::{DebuggerEvent, Reactive, ReactiveHandle, Runtime};
use super::subscriber::{SourceId, SubscriberId};

/// An opaque unit of deferred work, compared by identity.
///
/// Two `Job`s are equal only if they were cloned from the same original.
#[derive(Clone)]
pub struct Job(Rc<dyn Fn()>);

impl Job {
    /// Wrap a callback in a new job.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self(Rc::new(run))
    }

    /// Execute the job.
    pub fn run(&self) {
        (self.0)()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Job {}

impl Hash for Job {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Job").field(&self.addr()).finish()
    }
}

/// Hook receiving track/trigger events.
pub type DebugHook = Rc<dyn Fn(&DebuggerEvent)>;

/// Dispatcher receiving an effect's job instead of running it inline.
pub type SchedulerHook = Rc<dyn Fn(Job)>;

/// Optional observation hooks for an effect.
#[derive(Clone, Default)]
pub struct EffectHooks {
    /// Called the first time a source is read during a run.
    pub on_track: Option<DebugHook>,
    /// Called when a dependency is written.
    pub on_trigger: Option<DebugHook>,
    /// Called once when the effect is stopped.
    pub on_stop: Option<Rc<dyn Fn()>>,
}

impl EffectHooks {
    /// True if no hook is set.
    pub fn is_empty(&self) -> bool {
        self.on_track.is_none() && self.on_trigger.is_none() && self.on_stop.is_none()
    }
}

impl fmt::Debug for EffectHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHooks")
            .field("on_track", &self.on_track.is_some())
            .field("on_trigger", &self.on_trigger.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

/// Options for [`Effect::with_options`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Receives the effect's job on trigger. `None` runs the effect inline.
    pub scheduler: Option<SchedulerHook>,
    /// Observation hooks.
    pub hooks: EffectHooks,
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("scheduler", &self.scheduler.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

struct EffectInner {
    subscriber_id: SubscriberId,
    run: Rc<dyn Fn()>,
    options: EffectOptions,
    /// Sources read during the last run.
    dependencies: RefCell<SmallVec<[SourceId; 8]>>,
    active: Cell<bool>,
    running: Cell<bool>,
    run_count: Cell<usize>,
    /// The one job handed to the scheduler for every trigger.
    job: Job,
    _handle: RefCell<Option<ReactiveHandle>>,
}

impl EffectInner {
    fn execute(&self) {
        if !self.active.get() || self.running.get() {
            return;
        }

        struct Running<'a>(&'a Cell<bool>);
        impl Drop for Running<'_> {
            fn drop(&mut self) {
                self.0.set(false);
            }
        }
        self.running.set(true);
        let _running = Running(&self.running);

        let stale = std::mem::take(&mut *self.dependencies.borrow_mut());
        Runtime::remove_subscriber(self.subscriber_id, &stale);

        let run = Rc::clone(&self.run);
        let new_deps = {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            run();
            ReactiveContext::get_dependencies()
        };

        // Stopped from inside its own body: forget what was just tracked.
        if !self.active.get() {
            Runtime::remove_subscriber(self.subscriber_id, &new_deps);
            return;
        }

        *self.dependencies.borrow_mut() = new_deps;
        self.run_count.set(self.run_count.get() + 1);
    }

    fn stop(&self) {
        if !self.active.replace(false) {
            return;
        }

        let deps = std::mem::take(&mut *self.dependencies.borrow_mut());
        Runtime::remove_subscriber(self.subscriber_id, &deps);
        debug!(effect = ?self.subscriber_id, runs = self.run_count.get(), "effect stopped");

        if let Some(on_stop) = &self.options.hooks.on_stop {
            on_stop();
        }
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn on_track(&self, event: &DebuggerEvent) {
        if let Some(on_track) = &self.options.hooks.on_track {
            on_track(event);
        }
    }

    fn trigger(&self, event: &DebuggerEvent) {
        if !self.active.get() {
            return;
        }

        if let Some(on_trigger) = &self.options.hooks.on_trigger {
            on_trigger(event);
        }

        match &self.options.scheduler {
            Some(scheduler) => {
                trace!(effect = ?self.subscriber_id, source = %event.source, op = %event.op, "effect handed to scheduler");
                scheduler(self.job.clone());
            }
            None => self.execute(),
        }
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use weave_core::reactive::{Effect, ObservableBox};
///
/// let count = ObservableBox::new(0);
/// let seen = Rc::new(Cell::new(-1));
///
/// let effect = Effect::new({
///     let count = count.clone();
///     let seen = seen.clone();
///     move || seen.set(count.get())
/// });
/// assert_eq!(seen.get(), 0);
///
/// count.set(5);
/// assert_eq!(seen.get(), 5);
///
/// effect.stop();
/// count.set(6);
/// assert_eq!(seen.get(), 5);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create an effect that re-runs inline whenever a dependency changes.
    ///
    /// The function runs immediately to establish dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::with_options(run, EffectOptions::default())
    }

    /// Create an effect with a scheduler and/or hooks.
    ///
    /// The function runs immediately, synchronously, whatever the scheduler.
    pub fn with_options<F>(run: F, options: EffectOptions) -> Self
    where
        F: Fn() + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<EffectInner>| {
            let weak = weak.clone();
            EffectInner {
                subscriber_id: SubscriberId::new(),
                run: Rc::new(run),
                options,
                dependencies: RefCell::new(SmallVec::new()),
                active: Cell::new(true),
                running: Cell::new(false),
                run_count: Cell::new(0),
                job: Job::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.execute();
                    }
                }),
                _handle: RefCell::new(None),
            }
        });

        let handle = Runtime::register(inner.clone());
        *inner._handle.borrow_mut() = Some(handle);
        debug!(effect = ?inner.subscriber_id, scheduled = inner.options.scheduler.is_some(), "effect created");

        inner.execute();

        Self { inner }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Run the effect now, re-collecting dependencies.
    ///
    /// Does nothing once the effect is stopped.
    pub fn run(&self) {
        self.inner.execute();
    }

    /// The job this effect hands to its scheduler. Always the same job.
    pub fn job(&self) -> Job {
        self.inner.job.clone()
    }

    /// Stop the effect.
    ///
    /// Drops all dependencies and calls `on_stop`. Calling it again is a no-op.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// False once the effect has been stopped.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Get the number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of sources read during the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("active", &self.is_active())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects sources and
//! tracked computations. It records which subscribers read which sources
//! and notifies them when a source is written.
//!
//! # How It Works
//!
//! 1. When an effect is created, it registers with the runtime.
//!
//! 2. When an effect reads a source, the runtime records the dependency and
//!    fires the effect's `on_track` hook.
//!
//! 3. When a source is written, the runtime finds every subscriber of that
//!    source and hands it the trigger. The subscriber decides whether to run
//!    now or hand a job to its scheduler.
//!
//! # Threading
//!
//! The whole reactive graph is single-threaded. Registries live in
//! thread-local storage and hold `Rc`s; nothing here is `Send`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;

use super::context::ReactiveContext;
use super::subscriber::{SourceId, SubscriberId};

/// The kind of access or mutation reported to debugger hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A value was read.
    Get,
    /// Key presence was checked.
    Has,
    /// A key set was iterated.
    Iterate,
    /// An existing value was replaced.
    Set,
    /// A new key was inserted.
    Add,
    /// A key was removed.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Has => "has",
            Operation::Iterate => "iterate",
            Operation::Set => "set",
            Operation::Add => "add",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Payload passed to `on_track` and `on_trigger` hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerEvent {
    /// The computation being tracked or triggered.
    pub effect: SubscriberId,
    /// The source that was read or written.
    pub source: SourceId,
    /// What happened to the source.
    pub op: Operation,
    /// Key within a keyed container, if any.
    pub key: Option<String>,
}

/// A tracked computation the runtime can notify.
pub trait Reactive {
    /// Get the subscriber ID for this computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// Called the first time a source is read during a run.
    fn on_track(&self, event: &DebuggerEvent);

    /// Called when a source this computation depends on was written.
    fn trigger(&self, event: &DebuggerEvent);
}

/// Handle to a registered computation.
///
/// Dropping this handle unregisters the computation from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

impl fmt::Debug for ReactiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveHandle")
            .field("subscriber_id", &self.subscriber_id)
            .finish()
    }
}

thread_local! {
    // Weak references so the registry never keeps a computation alive.
    static REGISTRY: RefCell<HashMap<SubscriberId, Weak<dyn Reactive>>> = RefCell::new(HashMap::new());
    static SOURCE_SUBSCRIBERS: RefCell<HashMap<SourceId, IndexSet<SubscriberId>>> = RefCell::new(HashMap::new());
}

/// The per-thread reactive runtime.
pub struct Runtime;

impl Runtime {
    /// Register a computation with the runtime.
    ///
    /// Returns a handle that unregisters the computation when dropped.
    pub fn register(reactive: Rc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();

        REGISTRY.with(|registry| {
            registry.borrow_mut().insert(id, Rc::downgrade(&reactive));
        });

        ReactiveHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        let _ = REGISTRY.try_with(|registry| {
            registry.borrow_mut().remove(&id);
        });

        let _ = SOURCE_SUBSCRIBERS.try_with(|subscribers| {
            let mut subscribers = subscribers.borrow_mut();
            for subs in subscribers.values_mut() {
                subs.shift_remove(&id);
            }
            subscribers.retain(|_, subs| !subs.is_empty());
        });
    }

    fn lookup(id: SubscriberId) -> Option<Rc<dyn Reactive>> {
        REGISTRY.with(|registry| registry.borrow().get(&id).and_then(Weak::upgrade))
    }

    /// Record a read of `source` by the running computation, if any.
    ///
    /// Called by every reactive container on read.
    pub fn track(source: SourceId, op: Operation, key: Option<&str>) {
        let Some(subscriber_id) = ReactiveContext::current_subscriber() else {
            return;
        };

        if !ReactiveContext::track_dependency(source) {
            return;
        }

        Self::add_dependency(source, subscriber_id);

        if let Some(reactive) = Self::lookup(subscriber_id) {
            reactive.on_track(&DebuggerEvent {
                effect: subscriber_id,
                source,
                op,
                key: key.map(str::to_owned),
            });
        }
    }

    /// Record that a subscriber depends on a source.
    pub fn add_dependency(source: SourceId, subscriber_id: SubscriberId) {
        SOURCE_SUBSCRIBERS.with(|subscribers| {
            subscribers
                .borrow_mut()
                .entry(source)
                .or_default()
                .insert(subscriber_id);
        });
    }

    /// Remove a subscriber from the given sources.
    ///
    /// Called before re-running a computation and when it is stopped.
    pub fn remove_subscriber(subscriber_id: SubscriberId, sources: &[SourceId]) {
        let _ = SOURCE_SUBSCRIBERS.try_with(|subscribers| {
            let mut subscribers = subscribers.borrow_mut();
            for source in sources {
                if let Some(subs) = subscribers.get_mut(source) {
                    subs.shift_remove(&subscriber_id);
                    if subs.is_empty() {
                        subscribers.remove(source);
                    }
                }
            }
        });
    }

    /// Notify all subscribers that a source changed.
    ///
    /// The computation currently running is skipped so a body that writes
    /// what it reads does not retrigger itself.
    pub fn trigger(source: SourceId, op: Operation, key: Option<&str>) {
        let running = ReactiveContext::current_subscriber();

        let subscriber_ids: Vec<SubscriberId> = SOURCE_SUBSCRIBERS.with(|subscribers| {
            subscribers
                .borrow()
                .get(&source)
                .map(|subs| subs.iter().copied().filter(|id| Some(*id) != running).collect())
                .unwrap_or_default()
        });

        if subscriber_ids.is_empty() {
            return;
        }

        // Resolve everything before calling out; hooks may re-enter the runtime.
        let reactives: Vec<Rc<dyn Reactive>> =
            subscriber_ids.into_iter().filter_map(Self::lookup).collect();

        for reactive in reactives {
            reactive.trigger(&DebuggerEvent {
                effect: reactive.subscriber_id(),
                source,
                op,
                key: key.map(str::to_owned),
            });
        }
    }

    /// Number of subscribers currently depending on `source`.
    pub fn subscriber_count(source: SourceId) -> usize {
        SOURCE_SUBSCRIBERS.with(|subscribers| {
            subscribers.borrow().get(&source).map_or(0, IndexSet::len)
        })
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a tracked computation.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct MockReactive {
        id: SubscriberId,
        tracked: Cell<usize>,
        triggered: RefCell<Vec<Operation>>,
    }

    impl MockReactive {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                id: SubscriberId::new(),
                tracked: Cell::new(0),
                triggered: RefCell::new(Vec::new()),
            })
        }
    }

    impl Reactive for MockReactive {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn on_track(&self, _event: &DebuggerEvent) {
            self.tracked.set(self.tracked.get() + 1);
        }

        fn trigger(&self, event: &DebuggerEvent) {
            self.triggered.borrow_mut().push(event.op);
        }
    }

    #[test]
    fn runtime_registers_and_unregisters() {
        let reactive = MockReactive::new();
        let id = reactive.id;

        let handle = Runtime::register(reactive.clone());
        assert!(Runtime::lookup(id).is_some());

        drop(handle);
        assert!(Runtime::lookup(id).is_none());
    }

    #[test]
    fn runtime_notifies_subscribers() {
        let reactive = MockReactive::new();
        let _handle = Runtime::register(reactive.clone());
        let source = SourceId::new();

        Runtime::add_dependency(source, reactive.id);
        Runtime::trigger(source, Operation::Set, None);
        Runtime::trigger(SourceId::new(), Operation::Set, None);

        assert_eq!(*reactive.triggered.borrow(), vec![Operation::Set]);
    }

    #[test]
    fn track_records_first_read_only() {
        let reactive = MockReactive::new();
        let _handle = Runtime::register(reactive.clone());
        let source = SourceId::new();

        {
            let _ctx = ReactiveContext::enter(reactive.id);
            Runtime::track(source, Operation::Get, None);
            Runtime::track(source, Operation::Get, None);
        }

        assert_eq!(reactive.tracked.get(), 1);
        assert_eq!(Runtime::subscriber_count(source), 1);
    }

    #[test]
    fn track_outside_context_is_ignored() {
        let source = SourceId::new();
        Runtime::track(source, Operation::Get, None);
        assert_eq!(Runtime::subscriber_count(source), 0);
    }

    #[test]
    fn running_subscriber_is_not_retriggered() {
        let reactive = MockReactive::new();
        let _handle = Runtime::register(reactive.clone());
        let source = SourceId::new();
        Runtime::add_dependency(source, reactive.id);

        {
            let _ctx = ReactiveContext::enter(reactive.id);
            Runtime::trigger(source, Operation::Set, None);
        }

        assert!(reactive.triggered.borrow().is_empty());
    }

    #[test]
    fn runtime_removes_subscriber() {
        let reactive = MockReactive::new();
        let _handle = Runtime::register(reactive.clone());
        let source = SourceId::new();

        Runtime::add_dependency(source, reactive.id);
        assert_eq!(Runtime::subscriber_count(source), 1);

        Runtime::remove_subscriber(reactive.id, &[source]);
        assert_eq!(Runtime::subscriber_count(source), 0);
    }
}

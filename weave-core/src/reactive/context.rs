//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a source is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When entering a reactive context (running an effect), we push the
//! subscriber onto the stack. When the computation completes, we pop it.
//!
//! An *untracked* entry can also be pushed. Reads made while it is on top of
//! the stack are not recorded anywhere, even if a tracked computation is
//! running further down. Host renders and static-mode bodies run this way.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::subscriber::{SourceId, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The running computation, or `None` for an untracked section.
    subscriber_id: Option<SubscriberId>,
    /// Sources read during this computation, in first-read order.
    dependencies: SmallVec<[SourceId; 8]>,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// The context is exited when the returned guard is dropped.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(Some(subscriber_id))
    }

    /// Enter a section in which reads are not tracked.
    pub fn enter_untracked() -> Self {
        Self::push(None)
    }

    fn push(subscriber_id: Option<SubscriberId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: SmallVec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Run `f` with dependency tracking suspended.
    pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
        let _ctx = Self::enter_untracked();
        f()
    }

    /// Check if a tracked computation is currently collecting reads.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.subscriber_id))
    }

    /// Record a dependency on the given source.
    ///
    /// Returns `true` if this is the first read of `source` in the current
    /// context.
    pub fn track_dependency(source: SourceId) -> bool {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.last_mut() {
                Some(entry) if entry.subscriber_id.is_some() => {
                    if entry.dependencies.contains(&source) {
                        false
                    } else {
                        entry.dependencies.push(source);
                        true
                    }
                }
                _ => false,
            }
        })
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> SmallVec<[SourceId; 8]> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // `try_with` because guards can be dropped during thread teardown.
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

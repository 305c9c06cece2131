//! Reactive Effect Binding
//!
//! Ties one tracked computation to one mounted component instance.
//!
//! The computation renders the element from the reactive property set. Its
//! first run happens synchronously at mount and becomes the instance's
//! initial output. Every later run is triggered by a write to something the
//! previous run read, goes through the [`Scheduler`], and publishes the new
//! node to the instance's render-output state.
//!
//! # Lifecycle
//!
//! ```text
//! Mounting --activate--> Mounted --dispose--> Unmounting --> Disposed
//! ```
//!
//! Only a run in `Mounted` publishes. A job that was already queued when the
//! instance unmounted finds the effect stopped and does nothing; if it got
//! as far as the publish step it finds the binding past `Mounted` and drops
//! the node.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::cache::ElementKey;
use super::render::render;
use super::scheduler::Scheduler;
use crate::config::RenderMode;
use crate::host::VNode;
use crate::reactive::{Effect, EffectHooks, EffectOptions, ReactiveContext, ReadOnlyMap};

/// Where a rerun's node goes once the instance is mounted.
pub type Publish = Rc<dyn Fn(VNode)>;

/// Phase of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// First render in progress; runs store the initial output.
    Mounting,
    /// Runs publish to the instance.
    Mounted,
    /// Teardown started.
    Unmounting,
    /// Effect stopped. Terminal.
    Disposed,
}

struct BindingInner {
    key: ElementKey,
    lifecycle: Cell<Lifecycle>,
    initial: RefCell<Option<VNode>>,
    publish: RefCell<Option<Publish>>,
    effect: RefCell<Option<Effect>>,
    publish_count: Cell<usize>,
}

impl BindingInner {
    fn accept(&self, node: VNode) {
        match self.lifecycle.get() {
            Lifecycle::Mounting => *self.initial.borrow_mut() = Some(node),
            Lifecycle::Mounted => {
                let publish = self.publish.borrow().clone();
                match publish {
                    Some(publish) => {
                        self.publish_count.set(self.publish_count.get() + 1);
                        trace!(element = %self.key, "publishing rerun");
                        publish(node);
                    }
                    None => trace!(element = %self.key, "no publisher, dropping node"),
                }
            }
            lifecycle @ (Lifecycle::Unmounting | Lifecycle::Disposed) => {
                trace!(element = %self.key, ?lifecycle, "skipping publish after unmount")
            }
        }
    }
}

/// The tracked computation of one bridged component instance.
pub struct EffectBinding {
    inner: Rc<BindingInner>,
}

impl EffectBinding {
    /// Run the first render of `key` against `props`.
    ///
    /// In [`RenderMode::Interactive`] the render runs inside an effect whose
    /// reruns are handed to `scheduler`; `hooks` are forwarded to it. In
    /// [`RenderMode::Static`] it runs once, untracked, and no effect exists.
    pub fn mount(
        key: ElementKey,
        props: ReadOnlyMap,
        hooks: EffectHooks,
        scheduler: &Scheduler,
        mode: RenderMode,
    ) -> Self {
        let inner = Rc::new(BindingInner {
            key,
            lifecycle: Cell::new(Lifecycle::Mounting),
            initial: RefCell::new(None),
            publish: RefCell::new(None),
            effect: RefCell::new(None),
            publish_count: Cell::new(0),
        });

        match mode {
            RenderMode::Static => {
                let node = ReactiveContext::untracked(|| render(&inner.key, &props));
                inner.accept(node);
                debug!(element = %inner.key, "static render");
            }
            RenderMode::Interactive => {
                let weak: Weak<BindingInner> = Rc::downgrade(&inner);
                let body = move || {
                    if let Some(inner) = weak.upgrade() {
                        let node = render(&inner.key, &props);
                        inner.accept(node);
                    }
                };
                let effect = Effect::with_options(
                    body,
                    EffectOptions {
                        scheduler: Some(scheduler.hook()),
                        hooks,
                    },
                );
                debug!(element = %inner.key, effect = ?effect.id(), "binding mounted");
                *inner.effect.borrow_mut() = Some(effect);
            }
        }

        Self { inner }
    }

    /// The output of the first run. Empty if already taken.
    pub fn take_initial(&self) -> VNode {
        self.inner.initial.borrow_mut().take().unwrap_or_default()
    }

    /// Enter `Mounted`: from now on reruns go to `publish`.
    ///
    /// Ignored unless the binding is still `Mounting`.
    pub fn activate(&self, publish: impl Fn(VNode) + 'static) {
        if self.inner.lifecycle.get() != Lifecycle::Mounting {
            trace!(element = %self.inner.key, lifecycle = ?self.lifecycle(), "activate ignored");
            return;
        }
        *self.inner.publish.borrow_mut() = Some(Rc::new(publish));
        self.inner.lifecycle.set(Lifecycle::Mounted);
    }

    /// Stop the effect. Safe to call more than once; only the first call
    /// does anything.
    pub fn dispose(&self) {
        if matches!(
            self.inner.lifecycle.get(),
            Lifecycle::Unmounting | Lifecycle::Disposed
        ) {
            return;
        }

        self.inner.lifecycle.set(Lifecycle::Unmounting);
        self.inner.publish.borrow_mut().take();
        if let Some(effect) = self.inner.effect.borrow_mut().take() {
            effect.stop();
        }
        self.inner.lifecycle.set(Lifecycle::Disposed);
        debug!(element = %self.inner.key, publishes = self.publish_count(), "binding disposed");
    }

    /// Current phase.
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    /// The tracked computation, if any. `None` in static mode and after
    /// disposal.
    pub fn effect(&self) -> Option<Effect> {
        self.inner.effect.borrow().clone()
    }

    /// Number of reruns handed to the publisher.
    pub fn publish_count(&self) -> usize {
        self.inner.publish_count.get()
    }
}

impl Drop for EffectBinding {
    fn drop(&mut self) {
        // Dropped without an unmount: do not leave the effect registered.
        self.dispose();
    }
}

impl fmt::Debug for EffectBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBinding")
            .field("element", &self.inner.key)
            .field("lifecycle", &self.lifecycle())
            .field("publishes", &self.publish_count())
            .finish()
    }
}

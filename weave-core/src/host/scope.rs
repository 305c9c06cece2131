//! Per-instance hook storage.
//!
//! Every mounted component instance owns an ordered list of hook slots. A
//! render walks the list with a cursor: the n-th hook call of every render
//! reads the n-th slot, which is created on first render. That is what lets a
//! component keep local state, memoized values and cleanups across renders.

use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::{Error, Result};

/// Work to run when an instance unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

type AfterMount = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Hook storage and lifecycle of one component instance.
pub(crate) struct Instance {
    hooks: RefCell<Vec<Rc<dyn Any>>>,
    cleanups: RefCell<Vec<Cleanup>>,
    mounted: Cell<bool>,
    invalidate: Box<dyn Fn()>,
}

impl Instance {
    /// `invalidate` is called whenever local state changes.
    pub(crate) fn new(invalidate: impl Fn() + 'static) -> Self {
        Self {
            hooks: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            mounted: Cell::new(true),
            invalidate: Box::new(invalidate),
        }
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub(crate) fn push_cleanup(&self, cleanup: Cleanup) {
        self.cleanups.borrow_mut().push(cleanup);
    }

    /// Mark the instance unmounted and run its cleanups in registration order.
    pub(crate) fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        trace!(count = cleanups.len(), "running unmount cleanups");
        for cleanup in cleanups {
            cleanup();
        }
    }

    fn slot(&self, index: usize) -> Option<Rc<dyn Any>> {
        self.hooks.borrow().get(index).cloned()
    }

    fn push_slot(&self, slot: Rc<dyn Any>) {
        self.hooks.borrow_mut().push(slot);
    }
}

struct StateCell<T> {
    value: RefCell<Option<T>>,
}

/// Setter for a piece of local state created with [`Scope::use_state`].
///
/// Setting a value re-renders the owning instance. After unmount the value
/// is still stored but nothing re-renders.
pub struct StateSetter<T> {
    cell: Rc<StateCell<T>>,
    instance: Weak<Instance>,
}

impl<T> StateSetter<T> {
    /// Store `value` and request a re-render.
    pub fn set(&self, value: T) {
        *self.cell.value.borrow_mut() = Some(value);

        match self.instance.upgrade() {
            Some(instance) if instance.is_mounted() => (instance.invalidate)(),
            _ => trace!("state set on an unmounted instance"),
        }
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            instance: Weak::clone(&self.instance),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("type", &type_name::<T>())
            .finish()
    }
}

struct MemoSlot<T>(T);
struct EffectSlot;
struct UnmountSlot;

/// Render-time handle to an instance's hooks.
pub struct Scope {
    instance: Rc<Instance>,
    cursor: usize,
    first_render: bool,
    after_mount: Vec<AfterMount>,
}

impl Scope {
    pub(crate) fn new(instance: Rc<Instance>, first_render: bool) -> Self {
        Self {
            instance,
            cursor: 0,
            first_render,
            after_mount: Vec::new(),
        }
    }

    /// Effects queued by [`Scope::use_effect`] during this render.
    pub(crate) fn take_after_mount(&mut self) -> Vec<Box<dyn FnOnce() -> Option<Cleanup>>> {
        std::mem::take(&mut self.after_mount)
    }

    /// True during the instance's first render.
    pub fn is_first_render(&self) -> bool {
        self.first_render
    }

    /// Claim the next hook slot: the existing one, or `None` if this hook
    /// has not been called on this instance before.
    fn next_slot(&mut self) -> (usize, Option<Rc<dyn Any>>) {
        let index = self.cursor;
        self.cursor += 1;
        (index, self.instance.slot(index))
    }

    fn mismatch<T>(index: usize) -> Error {
        Error::HookMismatch {
            index,
            expected: type_name::<T>(),
        }
    }

    /// Local state initialized once per instance.
    pub fn use_state<T>(&mut self, init: impl FnOnce() -> T) -> Result<(T, StateSetter<T>)>
    where
        T: Clone + 'static,
    {
        self.use_state_with(|_| init())
    }

    /// Local state whose initializer also receives the setter.
    ///
    /// The initializer runs on first render only. It may stash the setter
    /// for later use, e.g. in a computation that publishes new values.
    pub fn use_state_with<T>(
        &mut self,
        init: impl FnOnce(&StateSetter<T>) -> T,
    ) -> Result<(T, StateSetter<T>)>
    where
        T: Clone + 'static,
    {
        let (index, slot) = self.next_slot();
        let instance = Rc::downgrade(&self.instance);

        if let Some(slot) = slot {
            let cell = slot
                .downcast::<StateCell<T>>()
                .map_err(|_| Self::mismatch::<T>(index))?;
            let value = cell
                .value
                .borrow()
                .clone()
                .ok_or_else(|| Self::mismatch::<T>(index))?;
            return Ok((value, StateSetter { cell, instance }));
        }

        let cell = Rc::new(StateCell {
            value: RefCell::new(None),
        });
        let setter = StateSetter {
            cell: Rc::clone(&cell),
            instance,
        };
        let value = init(&setter);
        *cell.value.borrow_mut() = Some(value.clone());
        self.instance.push_slot(cell);

        Ok((value, setter))
    }

    /// A value computed once per instance and returned on every render,
    /// whatever the props.
    pub fn use_force_memo<T>(&mut self, factory: impl FnOnce() -> T) -> Result<T>
    where
        T: Clone + 'static,
    {
        let (index, slot) = self.next_slot();

        if let Some(slot) = slot {
            let memo = slot
                .downcast::<MemoSlot<T>>()
                .map_err(|_| Self::mismatch::<T>(index))?;
            return Ok(memo.0.clone());
        }

        let value = factory();
        self.instance.push_slot(Rc::new(MemoSlot(value.clone())));
        Ok(value)
    }

    /// Run `effect` once after the instance mounts. Its returned cleanup, if
    /// any, runs at unmount.
    pub fn use_effect(
        &mut self,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        let (index, slot) = self.next_slot();

        if let Some(slot) = slot {
            return slot
                .downcast::<EffectSlot>()
                .map(drop)
                .map_err(|_| Self::mismatch::<EffectSlot>(index));
        }

        self.instance.push_slot(Rc::new(EffectSlot));
        self.after_mount.push(Box::new(effect));
        Ok(())
    }

    /// Register `cleanup` to run when the instance unmounts.
    ///
    /// Only the first render's registration counts.
    pub fn on_unmount(&mut self, cleanup: impl FnOnce() + 'static) -> Result<()> {
        let (index, slot) = self.next_slot();

        if let Some(slot) = slot {
            return slot
                .downcast::<UnmountSlot>()
                .map(drop)
                .map_err(|_| Self::mismatch::<UnmountSlot>(index));
        }

        self.instance.push_slot(Rc::new(UnmountSlot));
        self.instance.push_cleanup(Box::new(cleanup));
        Ok(())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cursor", &self.cursor)
            .field("first_render", &self.first_render)
            .field("pending_effects", &self.after_mount.len())
            .finish()
    }
}

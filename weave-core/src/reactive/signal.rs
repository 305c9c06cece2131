//! Observable Box
//!
//! An [`ObservableBox`] is the single-value reactive primitive. It holds a
//! value and reports reads and writes to the runtime.
//!
//! # How Boxes Work
//!
//! 1. When a box is read within a tracked computation, the runtime records
//!    that computation as a subscriber of the box.
//!
//! 2. When the box is written, every subscriber is triggered.
//!
//! A [`ReadOnlyView`] is a projection of the same slot. It shares identity
//! and lifetime with the box but exposes no write operation at all, so a
//! write through it is rejected at compile time:
//!
//! ```compile_fail
//! let (count, _set_count) = weave_core::bridge::readonly_ref(0);
//! count.set(5);
//! ```

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::runtime::{Operation, Runtime};
use super::subscriber::SourceId;

struct BoxInner<T> {
    source: SourceId,
    value: RefCell<T>,
}

/// A reactive single-value container.
///
/// Clones share the same slot.
///
/// # Example
///
/// ```rust
/// use weave_core::reactive::ObservableBox;
///
/// let count = ObservableBox::new(0);
/// count.set(5);
/// count.update(|n| *n += 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct ObservableBox<T> {
    inner: Rc<BoxInner<T>>,
}

impl<T: 'static> ObservableBox<T> {
    /// Create a new box with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(BoxInner {
                source: SourceId::new(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Get the source ID reads and writes are reported under.
    pub fn id(&self) -> SourceId {
        self.inner.source
    }

    /// Get a clone of the current value, tracking the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::track(self.inner.source, Operation::Get, None);
        f(&*self.inner.value.borrow())
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and trigger subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        Runtime::trigger(self.inner.source, Operation::Set, None);
    }

    /// Mutate the value in place and trigger subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut *self.inner.value.borrow_mut());
        Runtime::trigger(self.inner.source, Operation::Set, None);
    }

    /// Get a read-only projection of this box.
    pub fn read_only(&self) -> ReadOnlyView<T> {
        ReadOnlyView {
            inner: Rc::clone(&self.inner),
        }
    }

    /// True if both handles point at the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for ObservableBox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for ObservableBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableBox")
            .field("id", &self.inner.source)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

/// A read-only projection of an [`ObservableBox`].
///
/// Reads are forwarded (and tracked); there is no way to write.
pub struct ReadOnlyView<T> {
    inner: Rc<BoxInner<T>>,
}

impl<T: 'static> ReadOnlyView<T> {
    /// Get the source ID of the underlying box.
    pub fn id(&self) -> SourceId {
        self.inner.source
    }

    /// Get a clone of the current value, tracking the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::track(self.inner.source, Operation::Get, None);
        f(&*self.inner.value.borrow())
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// True if this view projects `target`.
    pub fn views(&self, target: &ObservableBox<T>) -> bool {
        Rc::ptr_eq(&self.inner, &target.inner)
    }
}

impl<T> Clone for ReadOnlyView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for ReadOnlyView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyView")
            .field("id", &self.inner.source)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

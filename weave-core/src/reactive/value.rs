//! Property Values
//!
//! Every property handed to a bridged component is one of three shapes:
//!
//! - a plain JSON value,
//! - an [`ObservableBox`] holding a JSON value (auto-unwrapped at render),
//! - a [`Callback`]: a zero-argument function returning a JSON value. On a
//!   host element it is either a lazy getter or an event handler depending
//!   on its key.
//!
//! Plain values compare by value. Boxes and callbacks compare by identity,
//! the way a reference would.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::signal::ObservableBox;

/// A zero-argument callable property, compared by identity.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn() -> Value>);

impl Callback {
    /// Wrap a value-producing function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Self(Rc::new(f))
    }

    /// Wrap a function that produces nothing, e.g. an event handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::new(move || {
            f();
            Value::Null
        })
    }

    /// Invoke the callback.
    pub fn call(&self) -> Value {
        (self.0)()
    }

    /// True if both handles wrap the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&(Rc::as_ptr(&self.0) as *const ()))
            .finish()
    }
}

/// A property value as supplied by a parent.
#[derive(Clone)]
pub enum PropValue {
    /// An immutable value.
    Plain(Value),
    /// A single-value reactive box.
    Observable(ObservableBox<Value>),
    /// A callable.
    Callable(Callback),
}

impl PropValue {
    /// A lazy getter / callable property.
    pub fn accessor<F>(f: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Self::Callable(Callback::new(f))
    }

    /// An event-handler property.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::Callable(Callback::handler(f))
    }

    /// Unwrap an observable box to its current value; pass anything else
    /// through unchanged. The box read is tracked.
    pub fn unref(&self) -> PropValue {
        match self {
            PropValue::Observable(boxed) => PropValue::Plain(boxed.get()),
            other => other.clone(),
        }
    }

    /// The plain value, if this is one.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            PropValue::Plain(value) => Some(value),
            _ => None,
        }
    }

    /// The callback, if this is one.
    pub fn as_callable(&self) -> Option<&Callback> {
        match self {
            PropValue::Callable(callback) => Some(callback),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Plain(a), PropValue::Plain(b)) => a == b,
            (PropValue::Observable(a), PropValue::Observable(b)) => a.ptr_eq(b),
            (PropValue::Callable(a), PropValue::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            PropValue::Observable(boxed) => f.debug_tuple("Observable").field(&boxed.id()).finish(),
            PropValue::Callable(callback) => callback.fmt(f),
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Plain(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Plain(Value::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Plain(Value::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Plain(Value::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Plain(Value::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Plain(Value::from(value))
    }
}

impl From<ObservableBox<Value>> for PropValue {
    fn from(boxed: ObservableBox<Value>) -> Self {
        PropValue::Observable(boxed)
    }
}

impl From<Callback> for PropValue {
    fn from(callback: Callback) -> Self {
        PropValue::Callable(callback)
    }
}

//! Components and the props they receive.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::node::VNode;
use super::scope::Scope;
use crate::error::Result;
use crate::reactive::{DebugHook, DebuggerEvent, EffectHooks, PropValue};

/// A renderable component.
///
/// `render` is called once at mount and again whenever the instance's local
/// state changes or its parent supplies new props. Hooks on `scope` must be
/// called in the same order on every render.
pub trait Component {
    /// Name used in diagnostics.
    fn name(&self) -> Cow<'_, str>;

    /// Produce this instance's output.
    fn render(&self, scope: &mut Scope, props: &Props) -> Result<VNode>;
}

/// Shared handle to a component, compared by pointer where identity matters.
pub type ComponentRef = Rc<dyn Component>;

/// The property set a parent passes to a component.
///
/// Besides ordinary values it carries optional effect debugging hooks, which
/// bridged components forward to their tracked computation.
#[derive(Clone, Default)]
pub struct Props {
    entries: IndexMap<String, PropValue>,
    hooks: EffectHooks,
}

impl Props {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.entries.shift_remove(key)
    }

    /// Get a property by key.
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    /// Iterate properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if both sets hold equal values under the same keys. Hooks are
    /// not compared.
    pub fn same_values(&self, other: &Props) -> bool {
        self.entries == other.entries
    }

    /// Effect debugging hooks carried alongside the values.
    pub fn hooks(&self) -> &EffectHooks {
        &self.hooks
    }

    /// Attach an `on_track` hook.
    pub fn on_track(mut self, hook: impl Fn(&DebuggerEvent) + 'static) -> Self {
        self.hooks.on_track = Some(Rc::new(hook) as DebugHook);
        self
    }

    /// Attach an `on_trigger` hook.
    pub fn on_trigger(mut self, hook: impl Fn(&DebuggerEvent) + 'static) -> Self {
        self.hooks.on_trigger = Some(Rc::new(hook) as DebugHook);
        self
    }

    /// Attach an `on_stop` hook.
    pub fn on_stop(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.on_stop = Some(Rc::new(hook));
        self
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("entries", &self.entries)
            .field("hooks", &self.hooks)
            .finish()
    }
}

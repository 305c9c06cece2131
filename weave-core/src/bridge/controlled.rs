//! Controlled State Factories
//!
//! Private mutable state, public read-only state. Each factory keeps the
//! writable [`ObservableBox`] to itself and hands out a [`ReadOnlyView`]
//! plus the only ways to change it: a [`Setter`], or a whitelist of named
//! actions.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::reactive::{ObservableBox, ReadOnlyView};

/// Write access to a box created by [`readonly_ref`].
pub struct Setter<T> {
    target: ObservableBox<T>,
}

impl<T: 'static> Setter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.target.set(value);
    }

    /// Modify the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.target.update(f);
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("target", &self.target.id()).finish()
    }
}

/// A read-only view of a fresh box holding `initial`, and its setter.
///
/// ```rust
/// let (count, set_count) = weave_core::bridge::readonly_ref(0);
/// assert_eq!(count.get(), 0);
/// set_count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub fn readonly_ref<T: 'static>(initial: T) -> (ReadOnlyView<T>, Setter<T>) {
    let target = ObservableBox::new(initial);
    (target.read_only(), Setter { target })
}

/// An action: receives the live box, then the caller's argument.
pub type Action<T, A> = Rc<dyn Fn(&ObservableBox<T>, A)>;

/// Named actions for [`readonly_reactive`], in registration order.
pub struct Actions<T, A> {
    actions: IndexMap<String, Action<T, A>>,
}

impl<T, A> Actions<T, A> {
    /// No actions yet.
    pub fn new() -> Self {
        Self {
            actions: IndexMap::new(),
        }
    }

    /// Register `action` under `name`, replacing any earlier one.
    pub fn with(mut self, name: impl Into<String>, action: impl Fn(&ObservableBox<T>, A) + 'static) -> Self {
        self.actions.insert(name.into(), Rc::new(action));
        self
    }
}

impl<T, A> Default for Actions<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Actions bound to the box they mutate.
pub struct BoundActions<T, A> {
    target: ObservableBox<T>,
    actions: IndexMap<String, Action<T, A>>,
}

impl<T: 'static, A: 'static> BoundActions<T, A> {
    /// Run the action registered as `name` with `arg`.
    pub fn dispatch(&self, name: &str, arg: A) -> Result<()> {
        let action = self.actions.get(name).ok_or_else(|| {
            warn!(action = name, "unknown action");
            Error::UnknownAction {
                name: name.to_owned(),
            }
        })?;
        trace!(action = name, "dispatching");
        action(&self.target, arg);
        Ok(())
    }

    /// The action registered as `name`, bound to the box.
    pub fn get(&self, name: &str) -> Option<impl Fn(A)> {
        let action = Rc::clone(self.actions.get(name)?);
        let target = self.target.clone();
        Some(move |arg: A| action(&target, arg))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl<T: 'static, A> fmt::Debug for BoundActions<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundActions")
            .field("target", &self.target.id())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A read-only view of a fresh box holding `initial`, and `actions` bound
/// to it.
pub fn readonly_reactive<T, A>(actions: Actions<T, A>, initial: T) -> (ReadOnlyView<T>, BoundActions<T, A>)
where
    T: 'static,
{
    let target = ObservableBox::new(initial);
    (
        target.read_only(),
        BoundActions {
            target,
            actions: actions.actions,
        },
    )
}

/// Like [`readonly_reactive`], with the initial value computed as
/// `init(arg)`.
pub fn readonly_reactive_with<T, A, I>(
    actions: Actions<T, A>,
    arg: I,
    init: impl FnOnce(I) -> T,
) -> (ReadOnlyView<T>, BoundActions<T, A>)
where
    T: 'static,
{
    readonly_reactive(actions, init(arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Todos {
        items: Vec<String>,
    }

    fn todo_actions() -> Actions<Todos, String> {
        Actions::new()
            .with("add", |todos: &ObservableBox<Todos>, item: String| {
                todos.update(|t| t.items.push(item))
            })
            .with("remove", |todos: &ObservableBox<Todos>, item: String| {
                todos.update(|t| t.items.retain(|i| *i != item))
            })
    }

    #[test]
    fn readonly_ref_reads_through_setter_writes() {
        let (count, set_count) = readonly_ref(0);
        assert_eq!(count.get(), 0);

        set_count.set(5);
        assert_eq!(count.get(), 5);

        set_count.update(|n| *n += 1);
        assert_eq!(count.get_untracked(), 6);
    }

    #[test]
    fn readonly_ref_writes_rerun_readers() {
        let (count, set_count) = readonly_ref(0);
        let seen = Rc::new(Cell::new(-1));
        let _effect = Effect::new({
            let seen = seen.clone();
            move || seen.set(count.get())
        });

        set_count.set(3);
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn actions_receive_the_live_box_first() {
        let (todos, actions) = readonly_reactive(todo_actions(), Todos { items: vec![] });

        actions.dispatch("add", "milk".to_owned()).unwrap();
        actions.dispatch("add", "eggs".to_owned()).unwrap();
        actions.dispatch("remove", "milk".to_owned()).unwrap();

        assert_eq!(todos.get().items, vec!["eggs"]);
        assert_eq!(actions.names().collect::<Vec<_>>(), vec!["add", "remove"]);
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let (todos, actions) = readonly_reactive(todo_actions(), Todos { items: vec![] });

        let err = actions.dispatch("clear", String::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownAction { ref name } if name == "clear"));
        assert!(actions.get("clear").is_none());
        assert!(todos.get().items.is_empty());
    }

    #[test]
    fn bound_actions_can_be_taken_out() {
        let (todos, actions) = readonly_reactive(todo_actions(), Todos { items: vec![] });
        let add = actions.get("add").unwrap();
        drop(actions);

        add("tea".to_owned());
        assert_eq!(todos.get().items, vec!["tea"]);
    }

    #[test]
    fn init_computes_the_initial_value() {
        let (count, actions) = readonly_reactive_with(
            Actions::new().with("add", |n: &ObservableBox<i64>, by: i64| n.update(|v| *v += by)),
            "41",
            |s: &str| s.parse().unwrap_or_default(),
        );
        actions.dispatch("add", 1).unwrap();
        assert_eq!(count.get(), 42);
    }
}

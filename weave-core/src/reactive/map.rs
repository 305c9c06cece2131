//! Reactive Map
//!
//! A keyed, shallow reactive container. Each key is its own source, and the
//! key set is one more source, so a computation that reads `title` is not
//! re-run when `width` changes, while one that iterates the map is re-run
//! when a key is added or removed.
//!
//! Values are stored as-is: a [`PropValue::Observable`] stored in the map is
//! not unwrapped or made deep-reactive by the map itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use super::runtime::{Operation, Runtime};
use super::subscriber::SourceId;
use super::value::PropValue;
use crate::error::{Error, Result};

struct Slot {
    source: SourceId,
    value: PropValue,
}

struct MapInner {
    keys_source: SourceId,
    entries: RefCell<IndexMap<String, Slot>>,
}

/// A keyed reactive container of [`PropValue`]s.
///
/// Clones share the same container.
#[derive(Clone)]
pub struct ReactiveMap {
    inner: Rc<MapInner>,
}

impl ReactiveMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MapInner {
                keys_source: SourceId::new(),
                entries: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the value stored under `key`, tracking the read.
    ///
    /// Reading a missing key tracks the key set, so a later insert of that
    /// key re-runs the reader.
    pub fn get(&self, key: &str) -> Option<PropValue> {
        let (source, value) = {
            let entries = self.inner.entries.borrow();
            match entries.get(key) {
                Some(slot) => (slot.source, Some(slot.value.clone())),
                None => (self.inner.keys_source, None),
            }
        };
        let op = if value.is_some() { Operation::Get } else { Operation::Has };
        Runtime::track(source, op, Some(key));
        value
    }

    /// Get the value stored under `key` without tracking.
    pub fn get_untracked(&self, key: &str) -> Option<PropValue> {
        self.inner
            .entries
            .borrow()
            .get(key)
            .map(|slot| slot.value.clone())
    }

    /// Check whether `key` is present, tracking the read.
    pub fn contains_key(&self, key: &str) -> bool {
        let (source, present) = {
            let entries = self.inner.entries.borrow();
            match entries.get(key) {
                Some(slot) => (slot.source, true),
                None => (self.inner.keys_source, false),
            }
        };
        Runtime::track(source, Operation::Has, Some(key));
        present
    }

    /// All keys in insertion order, tracking the key set.
    pub fn keys(&self) -> Vec<String> {
        Runtime::track(self.inner.keys_source, Operation::Iterate, None);
        self.keys_untracked()
    }

    /// All keys in insertion order, without tracking.
    pub fn keys_untracked(&self) -> Vec<String> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// All entries in insertion order, tracking the key set and every value.
    pub fn entries(&self) -> Vec<(String, PropValue)> {
        let snapshot: Vec<(String, SourceId, PropValue)> = self
            .inner
            .entries
            .borrow()
            .iter()
            .map(|(key, slot)| (key.clone(), slot.source, slot.value.clone()))
            .collect();

        Runtime::track(self.inner.keys_source, Operation::Iterate, None);
        snapshot
            .into_iter()
            .map(|(key, source, value)| {
                Runtime::track(source, Operation::Get, Some(&key));
                (key, value)
            })
            .collect()
    }

    /// Number of keys, tracking the key set.
    pub fn len(&self) -> usize {
        Runtime::track(self.inner.keys_source, Operation::Iterate, None);
        self.inner.entries.borrow().len()
    }

    /// True if the map has no keys, tracking the key set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `value` under `key`.
    ///
    /// Writing a value equal to the stored one is a no-op and triggers
    /// nothing. Returns the previous value.
    pub fn insert(&self, key: impl Into<String>, value: PropValue) -> Option<PropValue> {
        let key = key.into();
        let (previous, trigger) = {
            let mut entries = self.inner.entries.borrow_mut();
            match entries.get_mut(&key) {
                Some(slot) if slot.value == value => (Some(value), None),
                Some(slot) => {
                    let previous = std::mem::replace(&mut slot.value, value);
                    (Some(previous), Some((slot.source, Operation::Set)))
                }
                None => {
                    entries.insert(
                        key.clone(),
                        Slot {
                            source: SourceId::new(),
                            value,
                        },
                    );
                    (None, Some((self.inner.keys_source, Operation::Add)))
                }
            }
        };

        if let Some((source, op)) = trigger {
            Runtime::trigger(source, op, Some(&key));
        }
        previous
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Option<PropValue> {
        let removed = self.inner.entries.borrow_mut().shift_remove(key);
        let slot = removed?;

        Runtime::trigger(slot.source, Operation::Delete, Some(key));
        Runtime::trigger(self.inner.keys_source, Operation::Delete, Some(key));
        Some(slot.value)
    }

    /// Get a read-only projection of this map.
    pub fn read_only(&self) -> ReadOnlyMap {
        ReadOnlyMap { map: self.clone() }
    }

    /// True if both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ReactiveMap {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, PropValue)> for ReactiveMap {
    fn from_iter<I: IntoIterator<Item = (K, PropValue)>>(iter: I) -> Self {
        let map = Self::new();
        {
            let mut entries = map.inner.entries.borrow_mut();
            for (key, value) in iter {
                entries.insert(
                    key.into(),
                    Slot {
                        source: SourceId::new(),
                        value,
                    },
                );
            }
        }
        map
    }
}

impl fmt::Debug for ReactiveMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.inner.entries.borrow();
        f.debug_map()
            .entries(entries.iter().map(|(key, slot)| (key, &slot.value)))
            .finish()
    }
}

/// A read-only projection of a [`ReactiveMap`].
///
/// Reads are forwarded and tracked. Writes fail with [`Error::ReadOnly`].
#[derive(Clone)]
pub struct ReadOnlyMap {
    map: ReactiveMap,
}

impl ReadOnlyMap {
    /// See [`ReactiveMap::get`].
    pub fn get(&self, key: &str) -> Option<PropValue> {
        self.map.get(key)
    }

    /// See [`ReactiveMap::contains_key`].
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// See [`ReactiveMap::keys`].
    pub fn keys(&self) -> Vec<String> {
        self.map.keys()
    }

    /// See [`ReactiveMap::entries`].
    pub fn entries(&self) -> Vec<(String, PropValue)> {
        self.map.entries()
    }

    /// See [`ReactiveMap::len`].
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// See [`ReactiveMap::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Rejected: the projection is read-only.
    pub fn insert(&self, key: impl Into<String>, _value: PropValue) -> Result<Option<PropValue>> {
        let target = key.into();
        warn!(key = %target, "write rejected: map is read-only");
        Err(Error::ReadOnly { target })
    }

    /// Rejected: the projection is read-only.
    pub fn remove(&self, key: &str) -> Result<Option<PropValue>> {
        warn!(key, "delete rejected: map is read-only");
        Err(Error::ReadOnly {
            target: key.to_owned(),
        })
    }

    /// True if this view projects `target`.
    pub fn views(&self, target: &ReactiveMap) -> bool {
        self.map.ptr_eq(target)
    }
}

impl fmt::Debug for ReadOnlyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyMap").field(&self.map).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use serde_json::json;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn counter() -> (Rc<Cell<usize>>, impl Fn() + Clone) {
        let count = Rc::new(Cell::new(0));
        let bump = {
            let count = count.clone();
            move || count.set(count.get() + 1)
        };
        (count, bump)
    }

    #[test]
    fn insert_get_remove() {
        let map = ReactiveMap::new();
        assert_eq!(map.insert("a", json!(1).into()), None);
        assert_eq!(map.get("a"), Some(json!(1).into()));
        assert_eq!(map.insert("a", json!(2).into()), Some(json!(1).into()));
        assert_eq!(map.remove("a"), Some(json!(2).into()));
        assert_eq!(map.remove("a"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn reads_are_tracked_per_key() {
        let map: ReactiveMap = [("a", PropValue::from(1i64)), ("b", PropValue::from(2i64))]
            .into_iter()
            .collect();
        let (runs, bump) = counter();

        let _effect = Effect::new({
            let map = map.clone();
            move || {
                map.get("a");
                bump();
            }
        });
        assert_eq!(runs.get(), 1);

        map.insert("b", json!(20).into());
        assert_eq!(runs.get(), 1);

        map.insert("a", json!(10).into());
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn equal_write_does_not_trigger() {
        let map: ReactiveMap = [("a", PropValue::from("x"))].into_iter().collect();
        let (runs, bump) = counter();

        let _effect = Effect::new({
            let map = map.clone();
            move || {
                map.get("a");
                bump();
            }
        });

        map.insert("a", "x".into());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn key_set_changes_trigger_iteration() {
        let map = ReactiveMap::new();
        let (runs, bump) = counter();

        let _effect = Effect::new({
            let map = map.clone();
            move || {
                map.keys();
                bump();
            }
        });

        map.insert("a", json!(1).into());
        assert_eq!(runs.get(), 2);

        map.remove("a");
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn missing_key_read_reruns_on_insert() {
        let map = ReactiveMap::new();
        let seen = Rc::new(RefCell::new(None));

        let _effect = Effect::new({
            let (map, seen) = (map.clone(), seen.clone());
            move || *seen.borrow_mut() = map.get("late")
        });
        assert_eq!(*seen.borrow(), None);

        map.insert("late", "here".into());
        assert_eq!(*seen.borrow(), Some(PropValue::from("here")));
    }

    #[test]
    #[traced_test]
    fn read_only_projection_rejects_writes() {
        let map: ReactiveMap = [("a", PropValue::from(1i64))].into_iter().collect();
        let view = map.read_only();

        assert!(view.views(&map));
        assert_eq!(view.get("a"), Some(PropValue::from(1i64)));

        let err = view.insert("a", PropValue::from(2i64)).unwrap_err();
        assert!(matches!(err, Error::ReadOnly { ref target } if target == "a"));
        assert!(matches!(view.remove("a"), Err(Error::ReadOnly { .. })));

        // Nothing changed.
        assert_eq!(map.get("a"), Some(PropValue::from(1i64)));
        assert!(logs_contain("write rejected"));
        assert!(logs_contain("delete rejected"));
    }

    #[test]
    fn entries_keep_insertion_order() {
        let map = ReactiveMap::new();
        map.insert("z", json!(1).into());
        map.insert("a", json!(2).into());
        map.insert("m", json!(3).into());
        map.remove("a");

        let keys: Vec<String> = map.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "m"]);
    }
}

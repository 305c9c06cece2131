//! Property Bridging
//!
//! Parents hand components immutable [`Props`]. A bridged component needs
//! them as a reactive container instead, so that a tracked render re-runs
//! when a prop changes. [`ReactiveProps`] is that container: created once
//! per instance, then brought in line with every new `Props` by writing only
//! what changed.

use std::fmt;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::Result;
use crate::host::{Props, Scope};
use crate::reactive::{ReactiveContext, ReactiveMap, ReadOnlyMap};

/// A reactive property set with stable identity.
#[derive(Clone)]
pub struct ReactiveProps {
    map: ReactiveMap,
}

impl ReactiveProps {
    /// Copy `props` into a new reactive container.
    pub fn bridge(props: &Props) -> Self {
        let map = props
            .iter()
            .map(|(key, value)| (key, value.clone()))
            .collect();
        Self { map }
    }

    /// Make the container match `props`: write every key whose value
    /// differs and delete every key `props` no longer has. Returns the
    /// number of keys touched.
    ///
    /// Each write is an observable mutation; reruns it causes go through
    /// whatever scheduler the readers use.
    pub fn reconcile(&self, props: &Props) -> usize {
        ReactiveContext::untracked(|| {
            let keys: IndexSet<String> = self
                .map
                .keys_untracked()
                .into_iter()
                .chain(props.keys().map(str::to_owned))
                .collect();

            let mut touched = 0;
            for key in &keys {
                let current = self.map.get_untracked(key);
                match props.get(key) {
                    Some(next) if current.as_ref() != Some(next) => {
                        self.map.insert(key.as_str(), next.clone());
                        touched += 1;
                    }
                    Some(_) => {}
                    None => {
                        self.map.remove(key);
                        touched += 1;
                    }
                }
            }

            if touched > 0 {
                debug!(touched, keys = keys.len(), "props reconciled");
            }
            touched
        })
    }

    /// Read-only projection handed to renders.
    pub fn view(&self) -> ReadOnlyMap {
        self.map.read_only()
    }

    /// The underlying container.
    pub fn map(&self) -> &ReactiveMap {
        &self.map
    }

    /// True if both handles share one container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.map.ptr_eq(&other.map)
    }
}

impl fmt::Debug for ReactiveProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReactiveProps").field(&self.map).finish()
    }
}

/// Bridge `props` for the instance behind `scope`.
///
/// The container is created on the instance's first render and reconciled
/// against `props` on every later one.
pub fn use_reactive_props(scope: &mut Scope, props: &Props) -> Result<ReactiveProps> {
    let first_render = scope.is_first_render();
    let reactive = scope.use_force_memo(|| ReactiveProps::bridge(props))?;
    if !first_render {
        reactive.reconcile(props);
    }
    Ok(reactive)
}

//! Reactive Primitives
//!
//! This module implements the reactive-state side of the bridge: sources,
//! tracked computations, and the containers components read from.
//!
//! # Concepts
//!
//! ## Observable boxes
//!
//! An [`ObservableBox`] is a container for a single mutable value. When it is
//! read within a tracked computation, the box registers that computation as
//! a dependent. When it is written, every dependent is triggered.
//!
//! ## Reactive maps
//!
//! A [`ReactiveMap`] is a keyed container where every key is tracked on its
//! own. Bridged components keep their props in one.
//!
//! ## Effects
//!
//! An [`Effect`] is a computation that re-runs whenever one of its
//! dependencies changes, either inline or through a scheduler hook.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically. When a source is read, we check whether a
//! tracked computation is running and, if so, record the dependency.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod context;
mod effect;
mod map;
mod runtime;
mod signal;
mod subscriber;
mod value;

pub use context::ReactiveContext;
pub use effect::{DebugHook, Effect, EffectHooks, EffectOptions, Job, SchedulerHook};
pub use map::{ReactiveMap, ReadOnlyMap};
pub use runtime::{DebuggerEvent, Operation, Reactive, ReactiveHandle, Runtime};
pub use signal::{ObservableBox, ReadOnlyView};
pub use subscriber::{SourceId, SubscriberId};
pub use value::{Callback, PropValue};

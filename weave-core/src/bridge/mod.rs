//! Reactive Bridge
//!
//! Connects the component tree in [`crate::host`] to the reactive state in
//! [`crate::reactive`]. A bridged component renders inside a tracked effect:
//! whatever reactive value the render reads, a later write to it reruns the
//! render and republishes the node. Reruns are batched by a [`Scheduler`],
//! so N writes in one synchronous stretch cost one rerun.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use weave_core::bridge::{ComponentCache, Scheduler};
//! use weave_core::config::BridgeConfig;
//! use weave_core::host::{Props, Root};
//! use weave_core::reactive::ObservableBox;
//!
//! let scheduler = Scheduler::isolated();
//! let cache = ComponentCache::with_config(scheduler.clone(), BridgeConfig::default());
//!
//! let count = ObservableBox::new(json!(0));
//! let root = Root::mount(cache.get("span"), Props::new().with("count", count.clone())).unwrap();
//!
//! for n in 1..=3 {
//!     count.set(json!(n));
//! }
//! scheduler.run_until_idle();
//!
//! assert_eq!(root.output().value("count"), Some(&json!(3)));
//! assert_eq!(root.render_count(), 2);
//! ```

mod binding;
mod cache;
mod controlled;
mod microtask;
mod props;
mod render;
mod scheduler;
mod side_effect;

pub use binding::{EffectBinding, Lifecycle, Publish};
pub use cache::{BridgeComponent, ComponentCache, ElementKey};
pub use controlled::{
    readonly_reactive, readonly_reactive_with, readonly_ref, Action, Actions, BoundActions, Setter,
};
pub use microtask::MicrotaskQueue;
pub use props::{use_reactive_props, ReactiveProps};
pub use render::{is_event_handler, render, resolve_prop};
pub use scheduler::Scheduler;
pub use side_effect::SideEffect;

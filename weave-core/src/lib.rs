//! Weave Core
//!
//! Bridges fine-grained reactive state into a component tree. A bridged
//! component re-renders on its own when reactive state it read changes,
//! without the component tree's change detection, and those re-renders are
//! batched so a burst of writes costs one render.
//!
//! # Architecture
//!
//! - `reactive`: sources, effects with scheduler and debugging hooks,
//!   observable boxes, keyed reactive maps and their read-only views
//! - `host`: UI nodes, components, per-instance hooks and a mountable root
//! - `bridge`: the batching scheduler, per-instance effect binding, props
//!   bridging, render adapter, component cache and controlled-state
//!   factories
//! - `config`: render mode and prop update policy
//!
//! Everything is single-threaded: state lives in `Rc`/`RefCell` and
//! thread-local registries, and deferred work runs when the embedding event
//! loop drains the [`bridge::MicrotaskQueue`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use weave_core::bridge::{readonly_ref, ComponentCache, Scheduler};
//! use weave_core::config::BridgeConfig;
//! use weave_core::host::{Props, Root};
//! use weave_core::reactive::ObservableBox;
//!
//! let scheduler = Scheduler::isolated();
//! let cache = ComponentCache::with_config(scheduler.clone(), BridgeConfig::default());
//!
//! let title = ObservableBox::new(json!("draft"));
//! let root = Root::mount(cache.get("h1"), Props::new().with("text", title.clone())).unwrap();
//! assert_eq!(root.output().value("text"), Some(&json!("draft")));
//!
//! title.set(json!("final"));
//! scheduler.run_until_idle();
//! assert_eq!(root.output().value("text"), Some(&json!("final")));
//!
//! let (count, set_count) = readonly_ref(0);
//! set_count.set(5);
//! assert_eq!(count.get(), 5);
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod reactive;

pub use bridge::{ComponentCache, Scheduler};
pub use config::{set_static_rendering, BridgeConfig, PropUpdatePolicy, RenderMode};
pub use error::{Error, Result};

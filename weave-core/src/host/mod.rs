//! Host Rendering Model
//!
//! The component-tree side of the bridge, reduced to what bridged components
//! need from it:
//!
//! - [`create_element`] builds a [`VNode`] from a type and a property map.
//! - [`Scope`] gives an instance local state ([`Scope::use_state`]),
//!   instance-keyed memoization ([`Scope::use_force_memo`]), after-mount
//!   effects with cleanup ([`Scope::use_effect`]) and unmount callbacks.
//! - [`Root`] mounts a component, re-renders it, and unmounts it.
//!
//! There is no reconciler: a root renders exactly one component instance.

mod component;
mod node;
mod root;
mod scope;

pub use component::{Component, ComponentRef, Props};
pub use node::{create_element, Element, ElementType, ResolvedProp, VNode};
pub use root::Root;
pub use scope::{Cleanup, Scope, StateSetter};

//! Render Adapter
//!
//! Turns the reactive property set of a bridged component into one node.
//! Every read goes through the tracked accessors, so the enclosing effect
//! subscribes to each key and to every observable box it unwraps.
//!
//! # Resolution table
//!
//! | element   | value        | key is an event handler | result                  |
//! |-----------|--------------|-------------------------|-------------------------|
//! | host      | `Callable`   | no                      | call it, use the value  |
//! | host      | `Callable`   | yes                     | pass the callback       |
//! | any       | `Observable` |                         | current box value       |
//! | any       | `Plain`      |                         | the value               |
//! | composite | `Callable`   |                         | pass the callback       |

use indexmap::IndexMap;

use super::cache::ElementKey;
use crate::host::{create_element, ResolvedProp, VNode};
use crate::reactive::{PropValue, ReadOnlyMap};

/// True for keys like `onClick` or `onMouseEnter`: `on` directly followed by
/// an ASCII uppercase letter, anywhere in the key.
pub fn is_event_handler(key: &str) -> bool {
    key.as_bytes()
        .windows(3)
        .any(|w| w[0] == b'o' && w[1] == b'n' && w[2].is_ascii_uppercase())
}

/// Resolve one property for an element that is (`host`) or is not a host
/// element.
pub fn resolve_prop(host: bool, key: &str, value: &PropValue) -> ResolvedProp {
    match value {
        PropValue::Callable(callback) if host && !is_event_handler(key) => {
            ResolvedProp::Value(callback.call())
        }
        PropValue::Callable(callback) => ResolvedProp::Callback(callback.clone()),
        // Boxes and plain values both unref to a plain value.
        PropValue::Observable(_) | PropValue::Plain(_) => {
            ResolvedProp::Value(value.unref().as_plain().cloned().unwrap_or_default())
        }
    }
}

/// Build the node for `key` from the current property values.
pub fn render(key: &ElementKey, props: &ReadOnlyMap) -> VNode {
    let host = key.is_host();
    let resolved: IndexMap<String, ResolvedProp> = props
        .entries()
        .into_iter()
        .map(|(name, value)| {
            let prop = resolve_prop(host, &name, &value);
            (name, prop)
        })
        .collect();

    create_element(key.element_type(), resolved)
}

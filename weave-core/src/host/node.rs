//! UI nodes.
//!
//! A [`VNode`] is what a component render produces: either nothing, or one
//! element made of a type and a resolved property map. Nodes are plain data;
//! serializing one gives a stable snapshot for tests and debugging.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::component::ComponentRef;
use crate::reactive::Callback;

/// The type of an element.
#[derive(Clone)]
pub enum ElementType {
    /// A primitive element provided by the host, named by its tag.
    Host(Rc<str>),
    /// A user-defined component.
    Composite(ComponentRef),
    /// A grouping construct with no element of its own.
    Fragment,
}

impl ElementType {
    /// Display name: the tag, the component name, or `Fragment`.
    pub fn name(&self) -> String {
        match self {
            ElementType::Host(tag) => tag.to_string(),
            ElementType::Composite(component) => component.name().into_owned(),
            ElementType::Fragment => "Fragment".to_owned(),
        }
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Composite(a), ElementType::Composite(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (ElementType::Fragment, ElementType::Fragment) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => f.debug_tuple("Host").field(tag).finish(),
            ElementType::Composite(component) => {
                f.debug_tuple("Composite").field(&component.name()).finish()
            }
            ElementType::Fragment => f.write_str("Fragment"),
        }
    }
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// A property value after render-time resolution.
#[derive(Debug, Clone)]
pub enum ResolvedProp {
    /// A concrete value.
    Value(Value),
    /// A callable passed through untouched (event handlers, component callbacks).
    Callback(Callback),
}

impl ResolvedProp {
    /// The concrete value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ResolvedProp::Value(value) => Some(value),
            ResolvedProp::Callback(_) => None,
        }
    }

    /// The callback, if this is one.
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            ResolvedProp::Value(_) => None,
            ResolvedProp::Callback(callback) => Some(callback),
        }
    }
}

impl PartialEq for ResolvedProp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedProp::Value(a), ResolvedProp::Value(b)) => a == b,
            (ResolvedProp::Callback(a), ResolvedProp::Callback(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Serialize for ResolvedProp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResolvedProp::Value(value) => value.serialize(serializer),
            ResolvedProp::Callback(_) => serializer.serialize_str("[callback]"),
        }
    }
}

/// One element: a type and its resolved properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// What kind of element this is.
    pub element_type: ElementType,
    /// Resolved properties in supply order.
    pub props: IndexMap<String, ResolvedProp>,
}

/// The output of a render.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VNode {
    /// Renders nothing.
    #[default]
    Empty,
    /// A single element.
    Element(Element),
}

impl VNode {
    /// A node that renders nothing.
    pub fn empty() -> Self {
        VNode::Empty
    }

    /// True for [`VNode::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, VNode::Empty)
    }

    /// The element, if any.
    pub fn element(&self) -> Option<&Element> {
        match self {
            VNode::Empty => None,
            VNode::Element(element) => Some(element),
        }
    }

    /// The element type, if any.
    pub fn element_type(&self) -> Option<&ElementType> {
        self.element().map(|element| &element.element_type)
    }

    /// A resolved property by key.
    pub fn prop(&self, key: &str) -> Option<&ResolvedProp> {
        self.element().and_then(|element| element.props.get(key))
    }

    /// A resolved property's concrete value by key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.prop(key).and_then(ResolvedProp::as_value)
    }

    /// Snapshot of the node as JSON.
    pub fn to_json(&self) -> Value {
        // Serializing a VNode cannot fail: every leaf is a string or a Value.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for VNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VNode::Empty => serializer.serialize_unit(),
            VNode::Element(element) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &element.element_type)?;
                map.serialize_entry("props", &element.props)?;
                map.end()
            }
        }
    }
}

/// Create a node from a type and a property set.
pub fn create_element(element_type: ElementType, props: IndexMap<String, ResolvedProp>) -> VNode {
    VNode::Element(Element {
        element_type,
        props,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn element_accessors() {
        let mut props = IndexMap::new();
        props.insert("title".to_owned(), ResolvedProp::Value(json!("x")));
        props.insert("onClick".to_owned(), ResolvedProp::Callback(Callback::handler(|| {})));
        let node = create_element(ElementType::Host("div".into()), props);

        assert_eq!(node.element_type(), Some(&ElementType::Host("div".into())));
        assert_eq!(node.value("title"), Some(&json!("x")));
        assert!(node.value("onClick").is_none());
        assert!(node.prop("onClick").and_then(ResolvedProp::as_callback).is_some());
        assert!(node.prop("missing").is_none());
    }

    #[test]
    fn serializes_to_snapshot() {
        let mut props = IndexMap::new();
        props.insert("count".to_owned(), ResolvedProp::Value(json!(3)));
        props.insert("onClick".to_owned(), ResolvedProp::Callback(Callback::handler(|| {})));
        let node = create_element(ElementType::Fragment, props);

        assert_eq!(
            node.to_json(),
            json!({ "type": "Fragment", "props": { "count": 3, "onClick": "[callback]" } })
        );
        assert_eq!(VNode::empty().to_json(), Value::Null);
    }

    #[test]
    fn empty_node() {
        let node = VNode::default();
        assert!(node.is_empty());
        assert!(node.element().is_none());
        assert!(node.value("anything").is_none());
    }
}

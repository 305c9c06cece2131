//! Component Cache
//!
//! One bridge component per element type. The host renderer decides whether
//! two renders are "the same component" by identity, so handing out a fresh
//! component for `div` on every lookup would remount every bridged `div` on
//! every parent render. The cache makes lookups for equal keys return the
//! identical `Rc`.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::binding::EffectBinding;
use super::props::{use_reactive_props, ReactiveProps};
use super::scheduler::Scheduler;
use crate::config::{BridgeConfig, PropUpdatePolicy};
use crate::error::Result;
use crate::host::{Cleanup, Component, ComponentRef, ElementType, Props, Scope, VNode};

/// What a bridge component renders: a host tag or a component.
#[derive(Clone)]
pub enum ElementKey {
    /// A host element named by its tag. `Fragment` names the fragment.
    Tag(Rc<str>),
    /// A component, compared by pointer.
    Component(ComponentRef),
}

impl ElementKey {
    /// True for tags, which get host resolution rules.
    pub fn is_host(&self) -> bool {
        matches!(self, ElementKey::Tag(_))
    }

    /// The element type nodes are created with.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKey::Tag(tag) if &**tag == "Fragment" => ElementType::Fragment,
            ElementKey::Tag(tag) => ElementType::Host(Rc::clone(tag)),
            ElementKey::Component(component) => ElementType::Composite(Rc::clone(component)),
        }
    }

    /// The tag, or the component's name.
    pub fn display_name(&self) -> Cow<'_, str> {
        match self {
            ElementKey::Tag(tag) => Cow::Borrowed(&**tag),
            ElementKey::Component(component) => component.name(),
        }
    }

    fn addr(component: &ComponentRef) -> *const () {
        Rc::as_ptr(component) as *const ()
    }
}

impl PartialEq for ElementKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementKey::Tag(a), ElementKey::Tag(b)) => a == b,
            (ElementKey::Component(a), ElementKey::Component(b)) => {
                Self::addr(a) == Self::addr(b)
            }
            _ => false,
        }
    }
}

impl Eq for ElementKey {}

impl Hash for ElementKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ElementKey::Tag(tag) => {
                0u8.hash(state);
                tag.hash(state);
            }
            ElementKey::Component(component) => {
                1u8.hash(state);
                Self::addr(component).hash(state);
            }
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl fmt::Debug for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            ElementKey::Component(component) => {
                f.debug_tuple("Component").field(&component.name()).finish()
            }
        }
    }
}

impl From<&str> for ElementKey {
    fn from(tag: &str) -> Self {
        ElementKey::Tag(tag.into())
    }
}

impl From<String> for ElementKey {
    fn from(tag: String) -> Self {
        ElementKey::Tag(tag.into())
    }
}

impl From<ComponentRef> for ElementKey {
    fn from(component: ComponentRef) -> Self {
        ElementKey::Component(component)
    }
}

/// A component that renders its element type through a tracked effect.
///
/// Each mounted instance bridges its props into a [`ReactiveProps`], runs
/// the render inside an [`EffectBinding`] and shows the binding's latest
/// output. Reruns are batched by the cache's [`Scheduler`].
pub struct BridgeComponent {
    key: ElementKey,
    display_name: String,
    scheduler: Scheduler,
    config: BridgeConfig,
}

impl BridgeComponent {
    fn new(key: ElementKey, scheduler: Scheduler, config: BridgeConfig) -> Self {
        let display_name = format!("R.{}", key.display_name());
        Self {
            key,
            display_name,
            scheduler,
            config,
        }
    }

    /// The wrapped element type.
    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    /// `R.<tag or component name>`.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The configuration instances are created with.
    pub fn config(&self) -> BridgeConfig {
        self.config
    }

    fn bridged_props(&self, scope: &mut Scope, props: &Props) -> Result<ReactiveProps> {
        match self.config.prop_updates {
            PropUpdatePolicy::Reconcile => use_reactive_props(scope, props),
            PropUpdatePolicy::Frozen => {
                let reactive = scope.use_force_memo(|| ReactiveProps::bridge(props))?;
                // Last props seen, so state-driven re-renders stay quiet.
                let last_seen = scope.use_force_memo(|| Rc::new(RefCell::new(props.clone())))?;
                if !last_seen.borrow().same_values(props) {
                    warn!(
                        component = %self.display_name,
                        ?props,
                        "received new props, however they won't apply"
                    );
                    *last_seen.borrow_mut() = props.clone();
                }
                Ok(reactive)
            }
        }
    }
}

impl Component for BridgeComponent {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.display_name)
    }

    fn render(&self, scope: &mut Scope, props: &Props) -> Result<VNode> {
        let reactive = self.bridged_props(scope, props)?;

        let binding = scope.use_force_memo(|| {
            Rc::new(EffectBinding::mount(
                self.key.clone(),
                reactive.view(),
                props.hooks().clone(),
                &self.scheduler,
                self.config.render_mode,
            ))
        })?;

        let (node, setter) = scope.use_state_with(|_| binding.take_initial())?;

        scope.use_effect({
            let binding = Rc::clone(&binding);
            move || {
                binding.activate(move |node| setter.set(node));
                Some(Box::new(move || binding.dispose()) as Cleanup)
            }
        })?;

        Ok(node)
    }
}

impl fmt::Debug for BridgeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeComponent")
            .field("name", &self.display_name)
            .field("config", &self.config)
            .finish()
    }
}

/// Get-or-create registry of bridge components.
pub struct ComponentCache {
    scheduler: Scheduler,
    config: BridgeConfig,
    entries: RefCell<IndexMap<ElementKey, Rc<BridgeComponent>>>,
}

impl ComponentCache {
    /// A cache whose components batch on `scheduler`, configured from the
    /// process-wide [`BridgeConfig`] as it is right now.
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_config(scheduler, BridgeConfig::global())
    }

    /// A cache with an explicit configuration.
    pub fn with_config(scheduler: Scheduler, config: BridgeConfig) -> Self {
        Self {
            scheduler,
            config,
            entries: RefCell::new(IndexMap::new()),
        }
    }

    /// The bridge component for `key`, created on first request.
    pub fn get(&self, key: impl Into<ElementKey>) -> Rc<BridgeComponent> {
        let key = key.into();
        if let Some(component) = self.entries.borrow().get(&key) {
            return Rc::clone(component);
        }

        let component = Rc::new(BridgeComponent::new(
            key.clone(),
            self.scheduler.clone(),
            self.config,
        ));
        debug!(component = %component.display_name, "bridge component created");
        self.entries.borrow_mut().insert(key, Rc::clone(&component));
        component
    }

    /// Shorthand for a host tag.
    pub fn get_tag(&self, tag: &str) -> Rc<BridgeComponent> {
        self.get(tag)
    }

    /// The scheduler shared by this cache's components.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Number of distinct element types seen.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True before the first lookup.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for ComponentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCache")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderMode;
    use crate::host::{create_element, Root};
    use rstest::rstest;
    use tracing_test::traced_test;

    struct Card;

    impl Component for Card {
        fn name(&self) -> Cow<'_, str> {
            "Card".into()
        }

        fn render(&self, _scope: &mut Scope, _props: &Props) -> Result<VNode> {
            Ok(create_element(ElementType::Host("section".into()), Default::default()))
        }
    }

    fn cache() -> ComponentCache {
        ComponentCache::with_config(Scheduler::isolated(), BridgeConfig::default())
    }

    #[test]
    fn equal_keys_share_a_component() {
        let cache = cache();
        let first = cache.get("div");
        for _ in 0..10 {
            assert!(Rc::ptr_eq(&first, &cache.get("div")));
        }
        assert!(!Rc::ptr_eq(&first, &cache.get_tag("span")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn components_are_keyed_by_identity() {
        let cache = cache();
        let card: ComponentRef = Rc::new(Card);
        let other: ComponentRef = Rc::new(Card);

        let a = cache.get(Rc::clone(&card));
        assert!(Rc::ptr_eq(&a, &cache.get(card)));
        assert!(!Rc::ptr_eq(&a, &cache.get(other)));
        assert_eq!(a.display_name(), "R.Card");
    }

    #[rstest]
    #[case("div", "R.div")]
    #[case("Fragment", "R.Fragment")]
    fn display_names(#[case] tag: &str, #[case] expected: &str) {
        assert_eq!(cache().get(tag).display_name(), expected);
    }

    #[test]
    fn fragment_key_builds_fragments() {
        assert_eq!(ElementKey::from("Fragment").element_type(), ElementType::Fragment);
        assert!(ElementKey::from("Fragment").is_host());
        assert!(!ElementKey::from(Rc::new(Card) as ComponentRef).is_host());
    }

    #[test]
    fn composite_bridge_passes_resolved_props() {
        let cache = cache();
        let root = Root::mount(
            cache.get(Rc::new(Card) as ComponentRef),
            Props::new().with("title", "x"),
        )
        .unwrap();

        let output = root.output();
        assert_eq!(output.element_type().map(ElementType::name), Some("Card".to_owned()));
        assert_eq!(output.value("title"), Some(&serde_json::json!("x")));
    }

    #[test]
    #[traced_test]
    fn frozen_props_warn_and_keep_mount_values() {
        let scheduler = Scheduler::isolated();
        let cache = ComponentCache::with_config(
            scheduler.clone(),
            BridgeConfig::default().with_prop_updates(PropUpdatePolicy::Frozen),
        );
        let n = crate::reactive::ObservableBox::new(serde_json::json!(0));
        let root = Root::mount(
            cache.get("p"),
            Props::new().with("text", "a").with("n", n.clone()),
        )
        .unwrap();

        root.update(Props::new().with("text", "a").with("n", n.clone())).unwrap();
        assert!(!logs_contain("won't apply"));

        root.update(Props::new().with("text", "b").with("n", n.clone())).unwrap();
        scheduler.run_until_idle();
        assert!(logs_contain("R.p"));
        assert!(logs_contain("won't apply"));
        assert_eq!(root.output().value("text"), Some(&serde_json::json!("a")));

        // Re-renders driven by the instance's own state bring no new props.
        for value in 1..=3 {
            n.set(serde_json::json!(value));
            scheduler.run_until_idle();
        }
        assert_eq!(root.output().value("n"), Some(&serde_json::json!(3)));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("won't apply")).count() {
                1 => Ok(()),
                count => Err(format!("expected one warning, got {count}")),
            }
        });
    }

    #[test]
    fn static_cache_renders_without_effects() {
        let cache = ComponentCache::with_config(
            Scheduler::isolated(),
            BridgeConfig::default().with_render_mode(RenderMode::Static),
        );
        let component = cache.get("p");
        assert_eq!(component.config().render_mode, RenderMode::Static);

        let root = Root::mount(component, Props::new().with("text", "hi")).unwrap();
        assert_eq!(root.output().value("text"), Some(&serde_json::json!("hi")));
        root.unmount().unwrap();
    }
}

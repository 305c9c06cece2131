//! A mounted component.
//!
//! [`Root`] owns one component instance: it renders it at mount, re-renders
//! it when its local state changes or new props arrive, runs after-mount
//! effects, and tears it down at unmount. Child components in the returned
//! node are not mounted; the root is the unit of rendering.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error};

use super::component::{ComponentRef, Props};
use super::node::VNode;
use super::scope::{Instance, Scope};
use crate::error::{Error, Result};
use crate::reactive::ReactiveContext;

struct RootInner {
    component: ComponentRef,
    props: RefCell<Props>,
    instance: Rc<Instance>,
    output: RefCell<VNode>,
    render_count: Cell<usize>,
    rendering: Cell<bool>,
    needs_render: Cell<bool>,
    last_error: RefCell<Option<Error>>,
}

impl RootInner {
    fn render(&self) -> Result<()> {
        if !self.instance.is_mounted() {
            return Err(Error::NotMounted);
        }

        self.rendering.set(true);
        let result = self.render_until_stable();
        self.rendering.set(false);
        result
    }

    fn render_until_stable(&self) -> Result<()> {
        loop {
            self.needs_render.set(false);

            let first_render = self.render_count.get() == 0;
            let mut scope = Scope::new(Rc::clone(&self.instance), first_render);
            let props = self.props.borrow().clone();

            // Host renders never subscribe to anything themselves.
            let node = ReactiveContext::untracked(|| self.component.render(&mut scope, &props))?;

            *self.output.borrow_mut() = node;
            self.render_count.set(self.render_count.get() + 1);
            debug!(
                component = %self.component.name(),
                renders = self.render_count.get(),
                "rendered"
            );

            for effect in scope.take_after_mount() {
                if let Some(cleanup) = effect() {
                    self.instance.push_cleanup(cleanup);
                }
            }

            if !self.needs_render.get() || !self.instance.is_mounted() {
                return Ok(());
            }
        }
    }

    fn invalidate(&self) {
        if self.rendering.get() {
            self.needs_render.set(true);
            return;
        }

        if let Err(err) = self.render() {
            error!(component = %self.component.name(), %err, "re-render failed");
            *self.last_error.borrow_mut() = Some(err);
        }
    }
}

/// A mounted component instance.
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use std::rc::Rc;
/// use weave_core::host::{create_element, Component, ElementType, Props, Root, Scope, VNode};
/// use weave_core::Result;
///
/// struct Hello;
///
/// impl Component for Hello {
///     fn name(&self) -> Cow<'_, str> {
///         "Hello".into()
///     }
///
///     fn render(&self, _scope: &mut Scope, _props: &Props) -> Result<VNode> {
///         Ok(create_element(ElementType::Host("p".into()), Default::default()))
///     }
/// }
///
/// let root = Root::mount(Rc::new(Hello), Props::new()).unwrap();
/// assert_eq!(root.render_count(), 1);
/// root.unmount().unwrap();
/// ```
pub struct Root {
    inner: Rc<RootInner>,
}

impl Root {
    /// Mount `component` with `props` and render it once.
    ///
    /// Render errors are returned as-is.
    pub fn mount(component: ComponentRef, props: Props) -> Result<Self> {
        let inner = Rc::new_cyclic(|weak: &Weak<RootInner>| {
            let weak = weak.clone();
            RootInner {
                component,
                props: RefCell::new(props),
                instance: Rc::new(Instance::new(move || {
                    if let Some(root) = weak.upgrade() {
                        root.invalidate();
                    }
                })),
                output: RefCell::new(VNode::Empty),
                render_count: Cell::new(0),
                rendering: Cell::new(false),
                needs_render: Cell::new(false),
                last_error: RefCell::new(None),
            }
        });

        inner.render()?;
        Ok(Self { inner })
    }

    /// Supply new props and re-render.
    pub fn update(&self, props: Props) -> Result<()> {
        if !self.inner.instance.is_mounted() {
            return Err(Error::NotMounted);
        }
        *self.inner.props.borrow_mut() = props;
        self.inner.render()
    }

    /// Unmount the instance, running its cleanups.
    pub fn unmount(&self) -> Result<()> {
        if !self.inner.instance.is_mounted() {
            return Err(Error::NotMounted);
        }
        self.inner.instance.unmount();
        *self.inner.output.borrow_mut() = VNode::Empty;
        debug!(component = %self.inner.component.name(), "unmounted");
        Ok(())
    }

    /// The latest rendered output.
    pub fn output(&self) -> VNode {
        self.inner.output.borrow().clone()
    }

    /// Number of completed renders, including the first.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    /// False once unmounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.instance.is_mounted()
    }

    /// Take the error of the last failed state-driven re-render, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.inner.last_error.borrow_mut().take()
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("component", &self.inner.component.name())
            .field("render_count", &self.render_count())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

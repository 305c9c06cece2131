//! A component that only runs a side effect.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::error::Result;
use crate::host::{Cleanup, Component, Props, Scope, VNode};

type Callback = Rc<dyn Fn() -> Option<Cleanup>>;

/// Runs `callback` after each instance mounts and its cleanup, if any, when
/// that instance unmounts. Renders nothing.
///
/// The callback is fixed at construction; props supplied on later renders
/// do not rerun it and are reported as a diagnostic.
pub struct SideEffect {
    callback: Callback,
}

impl SideEffect {
    /// Wrap `callback`.
    pub fn new(callback: impl Fn() -> Option<Cleanup> + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }
}

impl Component for SideEffect {
    fn name(&self) -> Cow<'_, str> {
        "Effect".into()
    }

    fn render(&self, scope: &mut Scope, props: &Props) -> Result<VNode> {
        if !scope.is_first_render() && !props.is_empty() {
            warn!(?props, "<Effect> received new props, however they won't apply");
        }

        let callback = Rc::clone(&self.callback);
        scope.use_effect(move || callback())?;
        Ok(VNode::empty())
    }
}

impl fmt::Debug for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffect")
            .field("callback", &(Rc::as_ptr(&self.callback) as *const ()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Root;
    use std::cell::{Cell, RefCell};

    #[test]
    fn runs_after_mount_and_cleans_up_at_unmount() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let effect = SideEffect::new({
            let log = log.clone();
            move || {
                log.borrow_mut().push("run");
                let log = log.clone();
                Some(Box::new(move || log.borrow_mut().push("cleanup")) as Cleanup)
            }
        });

        let root = Root::mount(Rc::new(effect), Props::new()).unwrap();
        assert!(root.output().is_empty());
        assert_eq!(*log.borrow(), vec!["run"]);

        root.update(Props::new()).unwrap();
        root.update(Props::new().with("x", 1i64)).unwrap();
        assert_eq!(*log.borrow(), vec!["run"]);

        root.unmount().unwrap();
        assert_eq!(*log.borrow(), vec!["run", "cleanup"]);
    }

    #[test]
    fn callback_without_cleanup() {
        let runs = Rc::new(Cell::new(0));
        let effect = SideEffect::new({
            let runs = runs.clone();
            move || {
                runs.set(runs.get() + 1);
                None
            }
        });

        let root = Root::mount(Rc::new(effect), Props::new()).unwrap();
        root.unmount().unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn every_instance_runs_its_own_effect() {
        let runs = Rc::new(Cell::new(0));
        let cleanups = Rc::new(Cell::new(0));
        let effect = Rc::new(SideEffect::new({
            let runs = runs.clone();
            let cleanups = cleanups.clone();
            move || {
                runs.set(runs.get() + 1);
                let cleanups = cleanups.clone();
                Some(Box::new(move || cleanups.set(cleanups.get() + 1)) as Cleanup)
            }
        }));

        let first = Root::mount(effect.clone(), Props::new()).unwrap();
        let second = Root::mount(effect.clone(), Props::new()).unwrap();
        assert_eq!(runs.get(), 2);

        first.unmount().unwrap();
        assert_eq!(cleanups.get(), 1);

        let third = Root::mount(effect, Props::new()).unwrap();
        assert_eq!(runs.get(), 3);

        second.unmount().unwrap();
        third.unmount().unwrap();
        assert_eq!(cleanups.get(), 3);
    }
}

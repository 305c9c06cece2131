//! Integration Tests for the Reactive Bridge
//!
//! These tests mount bridged components on a root and drive them through
//! reactive writes, prop updates and unmounts.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};
use weave_core::bridge::{ComponentCache, Scheduler};
use weave_core::config::BridgeConfig;
use weave_core::host::{Props, ResolvedProp, Root};
use weave_core::reactive::{DebuggerEvent, ObservableBox, Operation, PropValue};

fn cache() -> (Scheduler, ComponentCache) {
    let scheduler = Scheduler::isolated();
    let cache = ComponentCache::with_config(scheduler.clone(), BridgeConfig::default());
    (scheduler, cache)
}

/// Three synchronous increments produce one re-render showing the last value.
#[test]
fn increments_in_one_window_rerender_once() {
    let (scheduler, cache) = cache();
    let count = ObservableBox::new(json!(0));

    let root = Root::mount(cache.get("span"), Props::new().with("count", count.clone())).unwrap();
    assert_eq!(root.output().value("count"), Some(&json!(0)));
    assert_eq!(root.render_count(), 1);

    for _ in 0..3 {
        count.update(|n| *n = json!(n.as_i64().unwrap_or_default() + 1));
    }

    // Nothing runs before the flush.
    assert_eq!(root.output().value("count"), Some(&json!(0)));
    assert_eq!(scheduler.pending_len(), 1);

    scheduler.run_until_idle();
    assert_eq!(root.output().value("count"), Some(&json!(3)));
    assert_eq!(root.render_count(), 2);
    assert_eq!(scheduler.flush_count(), 1);
}

/// A rerun that was queued before unmount does not publish.
#[test]
fn pending_rerun_after_unmount_is_dropped() {
    let (scheduler, cache) = cache();
    let count = ObservableBox::new(json!(0));
    let root = Root::mount(cache.get("span"), Props::new().with("count", count.clone())).unwrap();

    count.set(json!(1));
    assert_eq!(scheduler.pending_len(), 1);

    root.unmount().unwrap();
    scheduler.run_until_idle();

    assert!(root.output().is_empty());
    assert_eq!(root.render_count(), 1);
    assert!(root.take_error().is_none());
}

/// Each mount creates one effect and each unmount stops it once.
#[test]
fn one_effect_per_mount_one_stop_per_unmount() {
    let (scheduler, cache) = cache();
    let stops = Rc::new(Cell::new(0));
    let count = ObservableBox::new(json!(0));

    let props = || {
        let stops = stops.clone();
        Props::new()
            .with("count", count.clone())
            .on_stop(move || stops.set(stops.get() + 1))
    };

    for round in 1..=3 {
        let root = Root::mount(cache.get("span"), props()).unwrap();
        root.update(props()).unwrap();
        count.set(json!(round));
        scheduler.run_until_idle();
        assert_eq!(root.output().value("count"), Some(&json!(round)));

        root.unmount().unwrap();
        assert_eq!(stops.get(), round);
    }

    // No instance is left listening.
    count.set(json!(99));
    assert_eq!(scheduler.pending_len(), 0);
}

/// New props flow into the reactive property set and re-render in the next
/// batch; removed props disappear.
#[test]
fn prop_updates_are_reconciled() {
    let (scheduler, cache) = cache();
    let root = Root::mount(
        cache.get("div"),
        Props::new().with("a", 1i64).with("b", 2i64),
    )
    .unwrap();

    root.update(Props::new().with("a", 1i64).with("c", 3i64)).unwrap();
    scheduler.run_until_idle();

    let output = root.output();
    assert_eq!(output.value("a"), Some(&json!(1)));
    assert_eq!(output.value("c"), Some(&json!(3)));
    assert_eq!(output.prop("b"), None);
}

/// Identical props do not schedule anything.
#[test]
fn unchanged_props_schedule_nothing() {
    let (scheduler, cache) = cache();
    let props = Props::new().with("a", 1i64);
    let root = Root::mount(cache.get("div"), props.clone()).unwrap();

    root.update(props).unwrap();
    assert_eq!(scheduler.pending_len(), 0);
    assert_eq!(root.render_count(), 2);
}

/// Host getters are called (and tracked) during render, handlers are not.
#[test]
fn host_getters_track_and_handlers_pass_through() {
    let (scheduler, cache) = cache();
    let name = ObservableBox::new(json!("ada"));
    let clicks = Rc::new(Cell::new(0));

    let props = Props::new()
        .with("title", {
            let name = name.clone();
            PropValue::accessor(move || json!(format!("hello {}", name.get().as_str().unwrap_or(""))))
        })
        .with("onClick", {
            let clicks = clicks.clone();
            PropValue::handler(move || clicks.set(clicks.get() + 1))
        });
    let root = Root::mount(cache.get("button"), props).unwrap();

    assert_eq!(root.output().value("title"), Some(&json!("hello ada")));
    assert_eq!(clicks.get(), 0);

    name.set(json!("grace"));
    scheduler.run_until_idle();
    assert_eq!(root.output().value("title"), Some(&json!("hello grace")));

    let on_click = root.output().prop("onClick").and_then(ResolvedProp::as_callback).cloned();
    let on_click = on_click.expect("handler passed through");
    assert_eq!(on_click.call(), Value::Null);
    assert_eq!(clicks.get(), 1);
}

/// Roots on different schedulers do not share batches.
#[test]
fn isolated_schedulers_flush_independently() {
    let (first_scheduler, first_cache) = cache();
    let (second_scheduler, second_cache) = cache();
    let count = ObservableBox::new(json!(0));

    let first = Root::mount(first_cache.get("i"), Props::new().with("n", count.clone())).unwrap();
    let second = Root::mount(second_cache.get("i"), Props::new().with("n", count.clone())).unwrap();

    count.set(json!(5));
    first_scheduler.run_until_idle();

    assert_eq!(first.output().value("n"), Some(&json!(5)));
    assert_eq!(second.output().value("n"), Some(&json!(0)));

    second_scheduler.run_until_idle();
    assert_eq!(second.output().value("n"), Some(&json!(5)));
}

/// Several instances reading the same box rerun together in one flush.
#[test]
fn shared_state_reruns_every_reader_once() {
    let (scheduler, cache) = cache();
    let count = ObservableBox::new(json!(0));

    let roots: Vec<Root> = ["a", "b", "c"]
        .into_iter()
        .map(|tag| Root::mount(cache.get(tag), Props::new().with("n", count.clone())).unwrap())
        .collect();

    count.set(json!(1));
    count.set(json!(2));
    assert_eq!(scheduler.pending_len(), 3);

    scheduler.run_until_idle();
    for root in &roots {
        assert_eq!(root.render_count(), 2);
        assert_eq!(root.output().value("n"), Some(&json!(2)));
    }
    assert_eq!(scheduler.flush_count(), 1);
}

/// Debug hooks see what the render reads and what triggers it.
#[test]
fn debug_hooks_receive_events() {
    let (scheduler, cache) = cache();
    let count = ObservableBox::new(json!(0));
    let tracked: Rc<RefCell<Vec<DebuggerEvent>>> = Rc::default();
    let triggered: Rc<RefCell<Vec<DebuggerEvent>>> = Rc::default();

    let props = Props::new()
        .with("count", count.clone())
        .on_track({
            let tracked = tracked.clone();
            move |event| tracked.borrow_mut().push(event.clone())
        })
        .on_trigger({
            let triggered = triggered.clone();
            move |event| triggered.borrow_mut().push(event.clone())
        });
    let _root = Root::mount(cache.get("span"), props).unwrap();

    assert!(tracked
        .borrow()
        .iter()
        .any(|event| event.source == count.id() && event.op == Operation::Get));

    count.set(json!(1));
    {
        let triggered = triggered.borrow();
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].source, count.id());
        assert_eq!(triggered[0].op, Operation::Set);
    }
    scheduler.run_until_idle();
}

/// The cache hands out one component per element type, so remounts reuse it.
#[test]
fn cache_identity_is_stable() {
    let (_, cache) = cache();
    let div = cache.get("div");

    for _ in 0..100 {
        assert!(Rc::ptr_eq(&div, &cache.get("div")));
    }
    assert!(!Rc::ptr_eq(&div, &cache.get("span")));
    assert_eq!(cache.len(), 2);
}

//! Process-wide static rendering switch.
//!
//! Kept in its own test binary: the switch is global, and the other test
//! binaries assume the interactive default.

use serde_json::json;
use weave_core::bridge::{ComponentCache, Scheduler};
use weave_core::config::{set_static_rendering, BridgeConfig, RenderMode};
use weave_core::host::{Props, Root};
use weave_core::reactive::ObservableBox;

/// Caches snapshot the switch when built; static caches render once.
#[test]
fn static_switch_applies_to_caches_built_afterwards() {
    assert_eq!(BridgeConfig::global().render_mode, RenderMode::Interactive);

    set_static_rendering(true);
    let scheduler = Scheduler::isolated();
    let static_cache = ComponentCache::new(scheduler.clone());
    set_static_rendering(false);

    let count = ObservableBox::new(json!(0));
    let root = Root::mount(static_cache.get("span"), Props::new().with("count", count.clone())).unwrap();
    assert_eq!(root.output().value("count"), Some(&json!(0)));

    count.set(json!(1));
    assert_eq!(scheduler.pending_len(), 0);
    scheduler.run_until_idle();
    assert_eq!(root.output().value("count"), Some(&json!(0)));
    assert_eq!(root.render_count(), 1);
    root.unmount().unwrap();

    // Built after the switch was turned back off.
    let interactive = ComponentCache::new(scheduler.clone());
    let root = Root::mount(interactive.get("span"), Props::new().with("count", count.clone())).unwrap();
    count.set(json!(2));
    scheduler.run_until_idle();
    assert_eq!(root.output().value("count"), Some(&json!(2)));
}

//! Bridge Configuration
//!
//! Two knobs control how bridge components behave:
//!
//! - [`RenderMode`] picks the effect strategy. `Interactive` runs each render
//!   inside a tracked computation whose reruns are batched; `Static` runs the
//!   render once, synchronously, with no tracking (server-only rendering,
//!   snapshot generation).
//!
//! - [`PropUpdatePolicy`] decides what happens when a mounted bridge
//!   component receives new props from its parent.
//!
//! The process-wide default lives behind a lock so it can be flipped once at
//! startup with [`set_static_rendering`]. Caches snapshot it on construction;
//! tests that need isolation pass an explicit [`BridgeConfig`] instead.

use parking_lot::{const_rwlock, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Effect execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Dependency-tracked renders, reruns batched through the scheduler.
    #[default]
    Interactive,

    /// Render once, synchronously, without tracking or scheduling.
    Static,
}

/// What a mounted bridge component does with props supplied after mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropUpdatePolicy {
    /// Write changed props into the reactive property set.
    #[default]
    Reconcile,

    /// Keep the props seen at mount and emit a diagnostic.
    Frozen,
}

/// Configuration for bridge components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Effect strategy.
    pub render_mode: RenderMode,

    /// Handling of props supplied after mount.
    pub prop_updates: PropUpdatePolicy,
}

const DEFAULT_CONFIG: BridgeConfig = BridgeConfig {
    render_mode: RenderMode::Interactive,
    prop_updates: PropUpdatePolicy::Reconcile,
};

static GLOBAL: RwLock<BridgeConfig> = const_rwlock(DEFAULT_CONFIG);

impl BridgeConfig {
    /// Snapshot of the process-wide configuration.
    pub fn global() -> Self {
        *GLOBAL.read()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style setter for the render mode.
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Builder-style setter for the prop update policy.
    pub fn with_prop_updates(mut self, prop_updates: PropUpdatePolicy) -> Self {
        self.prop_updates = prop_updates;
        self
    }
}

/// Replace the process-wide configuration.
pub fn set_global(config: BridgeConfig) {
    *GLOBAL.write() = config;
}

/// Select static (`true`) or interactive (`false`) rendering process-wide.
///
/// Call this once before creating any component cache.
pub fn set_static_rendering(is_static: bool) {
    GLOBAL.write().render_mode = if is_static {
        RenderMode::Static
    } else {
        RenderMode::Interactive
    };
}

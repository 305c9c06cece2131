//! Error types.
//!
//! The bridge itself has very little that can fail: most failures are
//! programmer misuse (writing through a read-only view, calling hooks in a
//! different order between renders) and are reported here so the host can
//! surface them.

use thiserror::Error;

/// Errors produced by the bridge and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// A write was attempted through a read-only projection.
    #[error("cannot write `{target}`: target is read-only")]
    ReadOnly {
        /// What the caller tried to write (a key or a container name).
        target: String,
    },

    /// An action name that was never registered was dispatched.
    #[error("unknown action `{name}`")]
    UnknownAction {
        /// The name that was dispatched.
        name: String,
    },

    /// A root operation was attempted after the root was unmounted.
    #[error("component is not mounted")]
    NotMounted,

    /// A hook slot held a different type than the one requested.
    ///
    /// This happens when hooks are called conditionally or in a different
    /// order between two renders of the same instance.
    #[error("hook {index} does not hold a `{expected}`")]
    HookMismatch {
        /// Position of the hook call within the render.
        index: usize,
        /// Type the caller asked for.
        expected: &'static str,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

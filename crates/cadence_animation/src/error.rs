//! Animation error types

use thiserror::Error;

pub use cadence_core::ConfigError;

/// Property plugin failures
///
/// These are recorded per plugin by the [`PluginSet`](crate::PluginSet) and
/// never propagate to the animation that owns the set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// No accessor with this name exists on the target
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// The target object is gone
    #[error("Plugin target is unavailable: {0}")]
    TargetUnavailable(String),

    /// Generic plugin error
    #[error("Plugin error: {0}")]
    Other(String),
}

/// Invalid operations on composite animations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Duplicate child name: {0}")]
    DuplicateName(String),

    #[error("No child named {0}")]
    UnknownName(String),

    #[error("Invalid timeline offset: {0}")]
    InvalidOffset(f32),

    /// Infinite children would make cumulative sequence bookkeeping meaningless
    #[error("Animation {0} never completes and cannot join a sequence")]
    InfiniteElement(String),
}

/// Scheduler errors
#[derive(Error, Debug)]
pub enum AnimatorError {
    /// The animator behind a handle has been dropped
    #[error("Animator is no longer alive")]
    Dropped,

    #[error("Background thread is already running")]
    BackgroundRunning,

    #[error("Background thread is not running")]
    BackgroundNotRunning,

    #[error("A default animator is already installed")]
    DefaultAlreadyInstalled,

    #[error("Failed to spawn animator thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The background thread panicked outside of an animation step
    #[error("Animator thread panicked")]
    ThreadPanicked,
}

/// Result type for composite operations
pub type Result<T> = std::result::Result<T, CompositionError>;

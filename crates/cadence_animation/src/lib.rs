//! Cadence Animation
//!
//! Tweening engine built on the `cadence_core` timing model:
//!
//! - **Animation**: per-instance state machine turning wall-clock deltas
//!   into progress, with delays, repeats, time modes and play modes
//! - **Plugins**: pluggable property adapters, plus an accessor-based tween
//! - **Composition**: parallel groups, sequences and offset timelines
//! - **Scheduler**: an animator that ticks a concurrently mutated set of
//!   animations, in the foreground or on a background thread
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use cadence_animation::{AnimationBuilder, ClosureAccessor, Easing, PropertyTween};
//!
//! let opacity = Arc::new(Mutex::new(1.0_f32));
//! let (read, write) = (opacity.clone(), opacity.clone());
//!
//! let mut fade = AnimationBuilder::new()
//!     .duration(300.0)
//!     .easing(Easing::EASE_OUT)
//!     .plugin(PropertyTween::new(
//!         ClosureAccessor::new(
//!             move || Some(*read.lock().unwrap()),
//!             move |v: f32| *write.lock().unwrap() = v,
//!         ),
//!         0.0_f32,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! fade.start();
//! while !fade.step(16.0) {}
//! assert_eq!(*opacity.lock().unwrap(), 0.0);
//! ```

pub mod animation;
pub mod builder;
pub mod error;
pub mod parallel;
pub mod plugin;
pub mod property;
pub mod scheduler;
pub mod sequence;
pub mod timeline;

pub use animation::{Animation, AnimationKind, Lifecycle, MAX_CYCLES_PER_STEP};
pub use builder::AnimationBuilder;
pub use error::{AnimatorError, CompositionError, PluginError};
pub use parallel::{Parallel, ParallelCompletion, ParallelMut};
pub use plugin::{PluginContext, PluginSet, PropertyPlugin};
pub use property::{
    Accessor, AccessorTable, ClosureAccessor, Getter, PropertyTween, Setter, TableAccessor, Target,
};
pub use scheduler::{
    default_animator, install_default, AnimationId, AnimationStatus, Animator, AnimatorConfig,
    AnimatorHandle, Ticker,
};
pub use sequence::{Sequence, SequenceMut};
pub use timeline::{Timeline, TimelineMut};

// Re-export the core vocabulary
pub use cadence_core::{
    AnimationEvent, AnimationListener, Callbacks, ConfigError, Curve, EaseDirection, Easing,
    EventKind, EventMask, Interpolate, PlayMode, RelativeOp, Repeat, TimeBase, TimeMode,
    TimingConfig, TimingState, DEFAULT_FRAME_RATE,
};

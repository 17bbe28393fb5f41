//! Cadence Core
//!
//! The leaf vocabulary of the Cadence tweening engine:
//!
//! - **Easing**: curve formulas with in / out / in-out direction modifiers
//! - **Timing Model**: pure arithmetic from elapsed time to cycle progress,
//!   honoring delay, repeat, repeat delay, time scale, time mode and play mode
//! - **Events**: lifecycle event kinds, subscription masks and listeners
//! - **Values**: interpolation and relative-target resolution
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{TimingConfig, TimingState};
//!
//! let mut config = TimingConfig::new();
//! config.set_duration(500.0).unwrap();
//! config.set_delay(100.0).unwrap();
//!
//! let state = TimingState {
//!     elapsed_time: 350.0,
//!     ..Default::default()
//! };
//! assert!((config.raw_progress(&state, 500.0) - 0.5).abs() < 1e-6);
//! ```

pub mod easing;
pub mod error;
pub mod events;
pub mod timing;
pub mod values;

pub use easing::{Curve, EaseDirection, Easing};
pub use error::ConfigError;
pub use events::{
    AnimationEvent, AnimationListener, Callbacks, EventHandler, EventKind, EventMask,
};
pub use timing::{
    PlayMode, Repeat, TimeBase, TimeMode, TimingConfig, TimingState, DEFAULT_FRAME_RATE,
};
pub use values::{Interpolate, ParseRelativeOpError, RelativeOp};

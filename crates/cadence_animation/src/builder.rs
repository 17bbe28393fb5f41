//! Animation builder
//!
//! Chainable construction of tweens and composites over a [`TimingConfig`].
//! Invalid values are remembered and reported by the terminal `build*` call,
//! so a chain never panics halfway.
//!
//! # Example
//!
//! ```
//! use cadence_animation::{AnimationBuilder, Easing, Repeat};
//!
//! let anim = AnimationBuilder::new()
//!     .name("pulse")
//!     .duration(400.0)
//!     .repeat(Repeat::Times(3))
//!     .easing(Easing::EASE_IN_OUT)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(anim.span_ms(), 1200.0);
//! ```

use crate::animation::{Animation, AnimationKind};
use crate::parallel::{Parallel, ParallelCompletion};
use crate::plugin::{PluginSet, PropertyPlugin};
use crate::sequence::Sequence;
use crate::timeline::Timeline;
use cadence_core::{
    AnimationListener, Callbacks, ConfigError, Easing, EventMask, PlayMode, Repeat, TimeMode,
    TimingConfig,
};

/// Builder for [`Animation`]s
#[derive(Default)]
pub struct AnimationBuilder {
    name: Option<String>,
    config: TimingConfig,
    error: Option<ConfigError>,
    listener: Option<Box<dyn AnimationListener>>,
    /// Kinds the registered callbacks handle; narrows the event mask
    callbacks_mask: Option<EventMask>,
    plugins: PluginSet,
    one_run: bool,
}

impl AnimationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: TimingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn check(mut self, result: Result<(), ConfigError>) -> Self {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn duration(mut self, duration: f32) -> Self {
        let result = self.config.set_duration(duration);
        self.check(result)
    }

    pub fn delay(mut self, delay: f32) -> Self {
        let result = self.config.set_delay(delay);
        self.check(result)
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        let result = self.config.set_repeat(repeat);
        self.check(result)
    }

    pub fn repeat_delay(mut self, repeat_delay: f32) -> Self {
        let result = self.config.set_repeat_delay(repeat_delay);
        self.check(result)
    }

    pub fn time_scale(mut self, time_scale: f32) -> Self {
        let result = self.config.set_time_scale(time_scale);
        self.check(result)
    }

    pub fn time_mode(mut self, time_mode: TimeMode) -> Self {
        self.config.set_time_mode(time_mode);
        self
    }

    pub fn play_mode(mut self, play_mode: PlayMode) -> Self {
        self.config.set_play_mode(play_mode);
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.config.set_fps(fps);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.config.set_easing(easing);
        self
    }

    pub fn event_mask(mut self, mask: EventMask) -> Self {
        self.config.set_event_mask(mask);
        self
    }

    pub fn listener<L: AnimationListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Use typed callbacks as the listener
    ///
    /// Only their kinds are delivered. Combined with [`event_mask`](Self::event_mask)
    /// in any order, the two masks intersect.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks_mask = Some(callbacks.mask());
        self.listener(callbacks)
    }

    pub fn plugin<P: PropertyPlugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Sequences only: complete after the element that is playing
    pub fn one_run(mut self, one_run: bool) -> Self {
        self.one_run = one_run;
        self
    }

    fn finish(mut self, kind: AnimationKind, loop_duration: f32) -> Result<Animation, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.config.validate(loop_duration)?;
        if let Some(mask) = self.callbacks_mask {
            let narrowed = self.config.event_mask() & mask;
            self.config.set_event_mask(narrowed);
        }
        Ok(Animation::from_parts(
            self.name,
            self.config,
            self.listener,
            self.plugins,
            kind,
        ))
    }

    /// Build a plain tween
    pub fn build(self) -> Result<Animation, ConfigError> {
        let duration = self.config.duration();
        self.finish(AnimationKind::Tween, duration)
    }

    /// Build an empty parallel group
    pub fn build_parallel(self, completion: ParallelCompletion) -> Result<Animation, ConfigError> {
        // Group length follows its children unless the group sets it
        let duration = match completion {
            ParallelCompletion::AllChildren => f32::INFINITY,
            ParallelCompletion::OwnDuration => self.config.duration(),
        };
        self.finish(AnimationKind::Parallel(Parallel::new(completion)), duration)
    }

    /// Build an empty sequence
    pub fn build_sequence(self) -> Result<Animation, ConfigError> {
        let sequence = Sequence::new(self.one_run);
        self.finish(AnimationKind::Sequence(sequence), f32::INFINITY)
    }

    /// Build an empty timeline
    pub fn build_timeline(self) -> Result<Animation, ConfigError> {
        self.finish(AnimationKind::Timeline(Timeline::new()), f32::INFINITY)
    }
}

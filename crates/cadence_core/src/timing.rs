//! Timing model
//!
//! Pure arithmetic that turns accumulated elapsed time plus a
//! [`TimingConfig`] into cycle completion, normalized progress and a
//! completed-repeat counter. Nothing here performs I/O or fires events;
//! the animation state machine owns a [`TimingState`] and calls into these
//! functions every step.
//!
//! # Cycle layout
//!
//! Every cycle is preceded by the repeat delay; the first cycle is also
//! preceded by the initial delay:
//!
//! ```text
//! | delay | repeat_delay | duration | repeat_delay | duration | ...
//! |<------- cycle 0 ------------->|<----- cycle 1 ------->|
//! ```
//!
//! `elapsed_time` counts from the start of the current cycle window and is
//! re-based when a cycle ends.

use crate::easing::Easing;
use crate::error::{ConfigError, Result};
use crate::events::EventMask;

/// Frame rate used to convert milliseconds into frames when no fps is configured
pub const DEFAULT_FRAME_RATE: f32 = 60.0;

/// Unit in which durations and elapsed time are expressed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeMode {
    #[default]
    Milliseconds,
    Seconds,
    /// Frame counts; one frame lasts `1000 / frame_rate` milliseconds
    Frames,
}

/// Direction policy for progress within a cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayMode {
    /// 0.0 -> 1.0
    #[default]
    Forward,
    /// 1.0 -> 0.0
    Backward,
    /// 0.0 -> 1.0 -> 0.0 within one cycle
    Yoyo,
}

/// Number of cycles an animation plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Repeat {
    Times(u32),
    Infinite,
}

impl Repeat {
    /// Check if another cycle follows once `completed` cycles are done
    pub fn remains_after(&self, completed: u32) -> bool {
        match self {
            Repeat::Times(n) => completed < *n,
            Repeat::Infinite => true,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Repeat::Infinite)
    }

    /// Finite cycle count, `None` when infinite
    pub fn count(&self) -> Option<u32> {
        match self {
            Repeat::Times(n) => Some(*n),
            Repeat::Infinite => None,
        }
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Times(1)
    }
}

/// A time unit together with the frame rate needed to convert frames
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeBase {
    pub mode: TimeMode,
    pub frame_rate: f32,
}

impl TimeBase {
    pub const MILLISECONDS: TimeBase = TimeBase {
        mode: TimeMode::Milliseconds,
        frame_rate: DEFAULT_FRAME_RATE,
    };

    pub fn new(mode: TimeMode, frame_rate: f32) -> Self {
        Self { mode, frame_rate }
    }

    /// Convert a value in this unit into milliseconds
    pub fn to_millis(&self, value: f32) -> f32 {
        match self.mode {
            TimeMode::Milliseconds => value,
            TimeMode::Seconds => value * 1000.0,
            TimeMode::Frames => value * 1000.0 / self.frame_rate,
        }
    }

    /// Convert milliseconds into this unit
    pub fn from_millis(&self, millis: f32) -> f32 {
        match self.mode {
            TimeMode::Milliseconds => millis,
            TimeMode::Seconds => millis / 1000.0,
            TimeMode::Frames => millis * self.frame_rate / 1000.0,
        }
    }
}

/// Immutable timing parameters of one animation instance
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    duration: f32,
    delay: f32,
    repeat: Repeat,
    repeat_delay: f32,
    time_scale: f32,
    time_mode: TimeMode,
    play_mode: PlayMode,
    fps: u32,
    easing: Easing,
    event_mask: EventMask,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration: 0.0,
            delay: 0.0,
            repeat: Repeat::Times(1),
            repeat_delay: 0.0,
            time_scale: 1.0,
            time_mode: TimeMode::Milliseconds,
            play_mode: PlayMode::Forward,
            fps: 0,
            easing: Easing::LINEAR,
            event_mask: EventMask::ALL,
        }
    }
}

impl TimingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn repeat_delay(&self) -> f32 {
        self.repeat_delay
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn time_mode(&self) -> TimeMode {
        self.time_mode
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn event_mask(&self) -> EventMask {
        self.event_mask
    }

    // =========================================================================
    // Validated setters
    // =========================================================================

    /// Set the cycle duration (`f32::INFINITY` for an endless cycle)
    pub fn set_duration(&mut self, duration: f32) -> Result<()> {
        if duration.is_nan() || duration < 0.0 {
            return Err(ConfigError::InvalidDuration(duration));
        }
        self.duration = duration;
        Ok(())
    }

    pub fn set_delay(&mut self, delay: f32) -> Result<()> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::InvalidDelay(delay));
        }
        self.delay = delay;
        Ok(())
    }

    pub fn set_repeat(&mut self, repeat: Repeat) -> Result<()> {
        if repeat == Repeat::Times(0) {
            return Err(ConfigError::InvalidRepeat);
        }
        self.repeat = repeat;
        Ok(())
    }

    pub fn set_repeat_delay(&mut self, repeat_delay: f32) -> Result<()> {
        if !repeat_delay.is_finite() || repeat_delay < 0.0 {
            return Err(ConfigError::InvalidRepeatDelay(repeat_delay));
        }
        self.repeat_delay = repeat_delay;
        Ok(())
    }

    pub fn set_time_scale(&mut self, time_scale: f32) -> Result<()> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(ConfigError::InvalidTimeScale(time_scale));
        }
        self.time_scale = time_scale;
        Ok(())
    }

    pub fn set_time_mode(&mut self, time_mode: TimeMode) {
        self.time_mode = time_mode;
    }

    pub fn set_play_mode(&mut self, play_mode: PlayMode) {
        self.play_mode = play_mode;
    }

    /// Throttle reporting to `fps` updates per second (0 = every step)
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn set_event_mask(&mut self, event_mask: EventMask) {
        self.event_mask = event_mask;
    }

    /// Re-check every field, plus the loop constraint against `duration`
    ///
    /// Composites pass their derived cycle duration; tweens pass their own.
    pub fn validate(&self, duration: f32) -> Result<()> {
        let mut probe = TimingConfig::default();
        probe.set_duration(self.duration)?;
        probe.set_delay(self.delay)?;
        probe.set_repeat(self.repeat)?;
        probe.set_repeat_delay(self.repeat_delay)?;
        probe.set_time_scale(self.time_scale)?;
        if self.repeat.is_infinite() && duration <= 0.0 && self.repeat_delay <= 0.0 {
            return Err(ConfigError::ZeroLengthInfiniteLoop);
        }
        Ok(())
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Unit conversion for this configuration
    pub fn time_base(&self) -> TimeBase {
        let frame_rate = if self.fps > 0 {
            self.fps as f32
        } else {
            DEFAULT_FRAME_RATE
        };
        TimeBase::new(self.time_mode, frame_rate)
    }

    /// Fixed reporting step, in this configuration's unit
    ///
    /// `None` means every step is reported as-is.
    pub fn step_size(&self) -> Option<f32> {
        match self.time_mode {
            TimeMode::Frames => Some(1.0),
            _ if self.fps > 0 => Some(self.time_base().from_millis(1000.0 / self.fps as f32)),
            _ => None,
        }
    }

    /// Convert a wall-clock delta into scaled time in this configuration's unit
    pub fn scaled_delta(&self, dt_ms: f32) -> f32 {
        self.time_base().from_millis(dt_ms) * self.time_scale
    }

    /// Delay preceding the cycle after `completed` finished cycles
    pub fn active_delay(&self, completed: u32) -> f32 {
        if completed == 0 {
            self.delay + self.repeat_delay
        } else {
            self.repeat_delay
        }
    }

    /// Linear progress through the current cycle, in `[0, 1]`
    pub fn raw_progress(&self, state: &TimingState, duration: f32) -> f32 {
        if duration.is_infinite() {
            return 0.0;
        }
        if duration <= 0.0 {
            return 1.0;
        }
        let local = state.elapsed_time - self.active_delay(state.completed_repeats);
        (local / duration).clamp(0.0, 1.0)
    }

    /// Apply the play mode to a linear progress value
    pub fn directed(&self, raw: f32) -> f32 {
        match self.play_mode {
            PlayMode::Forward => raw,
            PlayMode::Backward => 1.0 - raw,
            PlayMode::Yoyo => {
                if raw <= 0.5 {
                    raw * 2.0
                } else {
                    (1.0 - raw) * 2.0
                }
            }
        }
    }

    /// Direction- and easing-adjusted position handed to property plugins
    pub fn position(&self, state: &TimingState, duration: f32) -> f32 {
        self.easing
            .apply(self.directed(self.raw_progress(state, duration)))
    }

    /// Time from start to completion (`f32::INFINITY` if it never completes)
    pub fn total_duration(&self, duration: f32) -> f32 {
        match self.repeat {
            Repeat::Infinite => f32::INFINITY,
            _ if duration.is_infinite() => f32::INFINITY,
            Repeat::Times(n) => self.delay + n as f32 * (self.repeat_delay + duration),
        }
    }

    /// Time since start, derived from the cycle counter and elapsed time
    pub fn total_elapsed(&self, state: &TimingState, duration: f32) -> f32 {
        if state.completed_repeats == 0 {
            state.elapsed_time
        } else {
            self.delay
                + state.completed_repeats as f32 * (self.repeat_delay + duration)
                + state.elapsed_time
        }
    }

    /// Inverse of [`total_elapsed`](Self::total_elapsed)
    ///
    /// Locates `time` (since start) as a cycle counter plus elapsed time.
    /// Times past the end land on the end of the last cycle.
    pub fn locate(&self, time: f32, duration: f32) -> TimingState {
        let time = time.max(0.0);
        let first = self.delay + self.repeat_delay + duration;
        let cycle = self.repeat_delay + duration;

        let (mut completed, mut elapsed) = if time < first || duration.is_infinite() {
            (0, time)
        } else if cycle <= 0.0 {
            (1, 0.0)
        } else {
            let after = time - first;
            let cycles = (after / cycle).floor();
            (1 + cycles as u32, after - cycles * cycle)
        };

        if let Repeat::Times(n) = self.repeat {
            if completed >= n {
                completed = n.saturating_sub(1);
                elapsed = if completed == 0 { first } else { cycle };
            }
        }

        TimingState {
            elapsed_time: elapsed,
            frame_accumulator: 0.0,
            completed_repeats: completed,
            has_begun: elapsed >= self.active_delay(completed),
        }
    }
}

/// Mutable timing state, owned by exactly one animation instance
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimingState {
    /// Time since the start of the current cycle window
    pub elapsed_time: f32,
    /// Sub-step remainder kept by the reporting throttle
    pub frame_accumulator: f32,
    pub completed_repeats: u32,
    /// Whether the delay of the current cycle has been crossed
    pub has_begun: bool,
}

impl TimingState {
    /// Fixed-timestep accumulator
    ///
    /// Adds `dt` and returns the whole steps that became reportable, or
    /// `None` when nothing crossed a step boundary. Without a step size the
    /// delta is reported unchanged.
    pub fn throttle(&mut self, dt: f32, step_size: Option<f32>) -> Option<f32> {
        let Some(step) = step_size.filter(|s| *s > 0.0) else {
            return Some(dt);
        };

        let total = self.frame_accumulator as f64 + dt as f64;
        if !total.is_finite() {
            self.frame_accumulator = 0.0;
            return Some(total as f32);
        }

        let step = step as f64;
        let whole = (total / step).floor();
        if whole < 1.0 {
            self.frame_accumulator = total.max(0.0) as f32;
            return None;
        }

        let advance = whole * step;
        self.frame_accumulator = (total - advance).clamp(0.0, step) as f32;
        Some(advance as f32)
    }
}

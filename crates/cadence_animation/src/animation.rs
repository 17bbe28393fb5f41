//! Animation state machine
//!
//! One [`Animation`] struct covers every variant: a plain tween, or one of
//! the composites ([`Parallel`], [`Sequence`], [`Timeline`]) that reuse the
//! same lifecycle to orchestrate child animations.
//!
//! ```text
//!            start()                pause()
//! Stopped ───────────► Running ◄─────────────► Paused
//!    ▲                    │          resume()
//!    └── complete/stop ───┘
//!
//! any ── mark_for_removal() ──► PendingRemoval (reaped by the owner)
//! ```
//!
//! `step(dt_ms)` converts the wall-clock delta into the animation's own time
//! unit, throttles it to the configured rate, crosses delays and cycle
//! boundaries, drives the variant, updates the plugin set and fires events.

use crate::parallel::{Parallel, ParallelMut};
use crate::plugin::{PluginContext, PluginSet};
use crate::sequence::{Sequence, SequenceMut};
use crate::timeline::{Timeline, TimelineMut};
use cadence_core::{AnimationEvent, AnimationListener, EventKind, TimingConfig, TimingState};
use std::fmt;

/// Cycle boundaries crossed with full event delivery within one step
pub const MAX_CYCLES_PER_STEP: u32 = 64;

/// Lifecycle state of an animation instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifecycle {
    #[default]
    Stopped,
    Running,
    Paused,
    /// Removal requested; the owner reaps it on its next tick
    PendingRemoval,
}

/// Outcome of driving one variant for one step
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Drive {
    Running,
    /// The cycle ended with `overshoot` time left over (own unit)
    CycleDone { overshoot: f32 },
    /// The animation completes regardless of remaining repeats
    Finished,
}

/// Variant of an animation
pub enum AnimationKind {
    Tween,
    Parallel(Parallel),
    Sequence(Sequence),
    Timeline(Timeline),
}

impl AnimationKind {
    /// Length of one cycle in the owner's time unit
    pub(crate) fn cycle_duration(&self, config: &TimingConfig) -> f32 {
        match self {
            AnimationKind::Tween => config.duration(),
            AnimationKind::Parallel(group) => group.cycle_duration(config),
            AnimationKind::Sequence(sequence) => {
                config.time_base().from_millis(sequence.total_ms())
            }
            AnimationKind::Timeline(timeline) => timeline.cycle_duration(config),
        }
    }

    /// Reset composite bookkeeping before a new run
    fn reset(&mut self) {
        match self {
            AnimationKind::Tween => {}
            AnimationKind::Parallel(group) => group.halt_children(),
            AnimationKind::Sequence(sequence) => sequence.reset(),
            AnimationKind::Timeline(timeline) => timeline.reset(),
        }
    }

    pub(crate) fn on_cycle_start(&mut self) {
        match self {
            AnimationKind::Tween => {}
            AnimationKind::Parallel(group) => group.restart_children(),
            AnimationKind::Sequence(sequence) => sequence.on_cycle_start(),
            AnimationKind::Timeline(timeline) => timeline.reset(),
        }
    }

    /// Advance the variant to `local` (time since the cycle's delay ended)
    fn drive(&mut self, config: &TimingConfig, local: f32, delta: f32) -> Drive {
        match self {
            AnimationKind::Tween => {
                let duration = config.duration();
                if duration.is_infinite() || local < duration {
                    Drive::Running
                } else {
                    Drive::CycleDone {
                        overshoot: local - duration.max(0.0),
                    }
                }
            }
            AnimationKind::Parallel(group) => group.drive(config, local, delta),
            AnimationKind::Sequence(sequence) => sequence.drive(config, delta),
            AnimationKind::Timeline(timeline) => timeline.drive(config, local),
        }
    }

    fn seek(&mut self, config: &TimingConfig, local: f32) {
        let local_ms = config.time_base().to_millis(local);
        match self {
            AnimationKind::Tween => {}
            AnimationKind::Parallel(group) => group.seek_ms(local_ms),
            AnimationKind::Sequence(sequence) => sequence.seek_ms(local_ms),
            AnimationKind::Timeline(timeline) => timeline.sync(config, local),
        }
    }

    /// Move every child to its end state
    fn finish(&mut self, config: &TimingConfig) {
        match self {
            AnimationKind::Tween => {}
            AnimationKind::Parallel(group) => group.finish_children(),
            AnimationKind::Sequence(sequence) => sequence.finish_remaining(),
            AnimationKind::Timeline(timeline) => {
                let duration = timeline.cycle_duration(config);
                timeline.sync(config, duration);
            }
        }
    }

    /// Silently stop every child
    fn halt(&mut self) {
        match self {
            AnimationKind::Tween => {}
            AnimationKind::Parallel(group) => group.halt_children(),
            AnimationKind::Sequence(sequence) => sequence.halt_all(),
            AnimationKind::Timeline(timeline) => timeline.reset(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AnimationKind::Tween => "Tween",
            AnimationKind::Parallel(_) => "Parallel",
            AnimationKind::Sequence(_) => "Sequence",
            AnimationKind::Timeline(_) => "Timeline",
        }
    }
}

// ============================================================================
// Core State
// ============================================================================

#[derive(Clone, Copy)]
pub(crate) enum PluginCall {
    Initialize,
    Begin,
    Update,
    End,
}

/// Variant-independent state of an animation
pub(crate) struct AnimationCore {
    pub(crate) name: Option<String>,
    pub(crate) config: TimingConfig,
    pub(crate) timing: TimingState,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) plugins: PluginSet,
    pub(crate) listener: Option<Box<dyn AnimationListener>>,
    /// Time consumed past the delay of the current cycle (own unit)
    pub(crate) cycle_local: f32,
    /// Reached (or was forced to) the end; progress reads as 1
    pub(crate) at_end: bool,
}

impl AnimationCore {
    fn progress_at(&self, duration: f32, at_end: bool) -> f32 {
        if at_end || self.at_end {
            1.0
        } else {
            self.config.raw_progress(&self.timing, duration)
        }
    }

    fn position_at(&self, duration: f32, at_end: bool) -> f32 {
        let progress = self.progress_at(duration, at_end);
        self.config.easing().apply(self.config.directed(progress))
    }

    pub(crate) fn emit(&mut self, kind: EventKind, duration: f32, at_end: bool) {
        if !self.config.event_mask().contains(kind) {
            return;
        }
        let position = self.position_at(duration, at_end);
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        let event = AnimationEvent {
            name: self.name.as_deref(),
            kind,
            completed_repeats: self.timing.completed_repeats,
            position,
        };
        listener.on_event(&event);
    }

    pub(crate) fn dispatch(&mut self, call: PluginCall, duration: f32, at_end: bool) {
        if self.plugins.is_empty() {
            return;
        }
        let progress = self.progress_at(duration, at_end);
        let ctx = PluginContext {
            name: self.name.as_deref(),
            position: self.config.easing().apply(self.config.directed(progress)),
            progress,
            elapsed: self.timing.elapsed_time,
            completed_repeats: self.timing.completed_repeats,
            at_end: at_end || self.at_end,
        };
        match call {
            PluginCall::Initialize => self.plugins.initialize(&ctx),
            PluginCall::Begin => self.plugins.begin(&ctx),
            PluginCall::Update => self.plugins.update(&ctx),
            PluginCall::End => self.plugins.end(&ctx),
        }
    }

    pub(crate) fn can_start(&self) -> bool {
        !matches!(
            self.lifecycle,
            Lifecycle::Running | Lifecycle::PendingRemoval
        )
    }

    /// Reset timing and bind plugins; the variant must be reset by the caller
    pub(crate) fn begin_run(&mut self, duration: f32) {
        self.timing = TimingState::default();
        self.cycle_local = 0.0;
        self.at_end = false;
        self.lifecycle = Lifecycle::Running;
        self.dispatch(PluginCall::Initialize, duration, false);
        tracing::debug!("Animation {:?} started", self.name);
    }

    /// First crossing of the current cycle's delay
    ///
    /// `start_variant` restarts the variant's children before any event fires.
    pub(crate) fn begin_cycle(&mut self, duration: f32, start_variant: impl FnOnce()) {
        self.timing.has_begun = true;
        self.cycle_local = 0.0;
        start_variant();
        if self.timing.completed_repeats == 0 {
            self.emit(EventKind::Begin, duration, false);
            self.dispatch(PluginCall::Begin, duration, false);
        }
        self.emit(EventKind::Start, duration, false);
    }

    /// Point the cycle-local clock at `local`, keeping elapsed time consistent
    pub(crate) fn place_local(&mut self, local: f32) {
        let delay = self.config.active_delay(self.timing.completed_repeats);
        self.cycle_local = local;
        self.timing.elapsed_time = delay + local;
    }
}

// ============================================================================
// Animation
// ============================================================================

/// A tween or composite animation instance
pub struct Animation {
    pub(crate) core: AnimationCore,
    pub(crate) kind: AnimationKind,
}

impl Animation {
    pub(crate) fn from_parts(
        name: Option<String>,
        config: TimingConfig,
        listener: Option<Box<dyn AnimationListener>>,
        plugins: PluginSet,
        kind: AnimationKind,
    ) -> Self {
        Self {
            core: AnimationCore {
                name,
                config,
                timing: TimingState::default(),
                lifecycle: Lifecycle::Stopped,
                plugins,
                listener,
                cycle_local: 0.0,
                at_end: false,
            },
            kind,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    pub fn config(&self) -> &TimingConfig {
        &self.core.config
    }

    pub fn kind(&self) -> &AnimationKind {
        &self.kind
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.core.lifecycle == Lifecycle::Running
    }

    pub fn timing_state(&self) -> &TimingState {
        &self.core.timing
    }

    pub fn completed_repeats(&self) -> u32 {
        self.core.timing.completed_repeats
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.core.plugins
    }

    /// Length of one cycle in this animation's time unit
    ///
    /// Composites derive it from their children.
    pub fn cycle_duration(&self) -> f32 {
        self.kind.cycle_duration(&self.core.config)
    }

    /// Time from start to completion, in this animation's time unit
    pub fn total_duration(&self) -> f32 {
        self.core.config.total_duration(self.cycle_duration())
    }

    /// Wall-clock milliseconds from start to completion
    pub fn span_ms(&self) -> f32 {
        let config = &self.core.config;
        config.time_base().to_millis(self.total_duration()) / config.time_scale()
    }

    /// Wall-clock milliseconds consumed since start
    pub fn elapsed_span_ms(&self) -> f32 {
        let config = &self.core.config;
        let elapsed = config.total_elapsed(&self.core.timing, self.cycle_duration());
        config.time_base().to_millis(elapsed) / config.time_scale()
    }

    /// Linear progress through the current cycle
    pub fn progress(&self) -> f32 {
        self.core.progress_at(self.cycle_duration(), false)
    }

    /// Direction- and easing-adjusted progress
    pub fn position(&self) -> f32 {
        self.core.position_at(self.cycle_duration(), false)
    }

    pub fn set_listener<L: AnimationListener + 'static>(&mut self, listener: L) {
        self.core.listener = Some(Box::new(listener));
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start from the beginning
    ///
    /// No-op while running or pending removal. A paused animation is reset.
    pub fn start(&mut self) {
        if !self.core.can_start() {
            return;
        }
        if self.core.lifecycle == Lifecycle::Paused {
            self.halt();
        }
        self.kind.reset();
        let duration = self.cycle_duration();
        self.core.begin_run(duration);
    }

    /// Release plugins, reset and start again
    pub fn restart(&mut self) {
        if self.core.lifecycle == Lifecycle::PendingRemoval {
            return;
        }
        self.halt();
        self.start();
        let duration = self.cycle_duration();
        self.core.emit(EventKind::Restart, duration, false);
    }

    pub fn pause(&mut self) {
        if self.core.lifecycle != Lifecycle::Running {
            return;
        }
        self.core.lifecycle = Lifecycle::Paused;
        let duration = self.cycle_duration();
        self.core.emit(EventKind::Pause, duration, false);
    }

    pub fn resume(&mut self) {
        if self.core.lifecycle != Lifecycle::Paused {
            return;
        }
        self.core.lifecycle = Lifecycle::Running;
        let duration = self.cycle_duration();
        self.core.emit(EventKind::Resume, duration, false);
    }

    /// Stop a running or paused animation
    ///
    /// With `goto_end` the current cycle is forced to its end (children
    /// included) and written once more before plugins are released.
    pub fn stop(&mut self, goto_end: bool) {
        if !matches!(self.core.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
            return;
        }
        let duration = self.cycle_duration();
        let at_end = goto_end && duration.is_finite();
        if at_end {
            self.core.timing.has_begun = true;
            self.core.place_local(duration.max(0.0));
            self.kind.finish(&self.core.config);
            self.core.dispatch(PluginCall::Update, duration, true);
            self.core.at_end = true;
        } else {
            self.kind.halt();
        }
        self.core.dispatch(PluginCall::End, duration, at_end);
        self.core.lifecycle = Lifecycle::Stopped;
        tracing::debug!("Animation {:?} stopped (goto_end: {})", self.core.name, goto_end);
        self.core.emit(EventKind::Stop, duration, at_end);
    }

    /// Request removal; the owner drops it on its next tick
    pub fn mark_for_removal(&mut self) {
        if self.core.lifecycle == Lifecycle::PendingRemoval {
            return;
        }
        self.halt();
        self.core.lifecycle = Lifecycle::PendingRemoval;
        tracing::debug!("Animation {:?} marked for removal", self.core.name);
    }

    /// Stop without events
    pub(crate) fn halt(&mut self) {
        if !matches!(self.core.lifecycle, Lifecycle::Running | Lifecycle::Paused) {
            return;
        }
        let duration = self.cycle_duration();
        self.kind.halt();
        self.core.dispatch(PluginCall::End, duration, false);
        self.core.lifecycle = Lifecycle::Stopped;
    }

    /// Bring a child to its end state once, starting it if needed
    pub(crate) fn finish(&mut self) {
        if self.core.at_end {
            return;
        }
        if self.core.lifecycle == Lifecycle::Stopped {
            self.start();
        }
        self.stop(true);
    }

    /// Write the start state and go back to a silent stop
    pub(crate) fn rewind(&mut self) {
        if self.core.lifecycle == Lifecycle::Stopped {
            self.start();
        }
        self.seek(0.0);
        self.halt();
    }

    // =========================================================================
    // Seeking
    // =========================================================================

    /// Jump to `time` since start, in this animation's time unit
    ///
    /// Fires no events. Times past the end land on the end of the last cycle.
    pub fn seek(&mut self, time: f32) {
        if self.core.lifecycle == Lifecycle::PendingRemoval {
            return;
        }
        let duration = self.cycle_duration();
        self.core.timing = self.core.config.locate(time, duration);
        self.core.at_end = false;

        let delay = self
            .core
            .config
            .active_delay(self.core.timing.completed_repeats);
        let local = (self.core.timing.elapsed_time - delay).max(0.0);
        self.core.cycle_local = local;
        if self.core.timing.has_begun {
            self.kind.seek(&self.core.config, local);
        }
        self.core.dispatch(PluginCall::Update, duration, false);
    }

    /// Jump to a wall-clock offset from start
    pub fn seek_ms(&mut self, millis: f32) {
        let config = &self.core.config;
        let time = config.time_base().from_millis(millis) * config.time_scale();
        self.seek(time);
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance by `dt_ms` wall-clock milliseconds
    ///
    /// Returns `true` once the animation is finished (stopped, completed or
    /// pending removal). Paused animations return `false` without consuming time.
    pub fn step(&mut self, dt_ms: f32) -> bool {
        match self.core.lifecycle {
            Lifecycle::Stopped | Lifecycle::PendingRemoval => return true,
            Lifecycle::Paused => return false,
            Lifecycle::Running => {}
        }

        let config = &self.core.config;
        let dt = config.scaled_delta(dt_ms);
        let step_size = config.step_size();
        let Some(advance) = self.core.timing.throttle(dt, step_size) else {
            return false;
        };
        self.core.timing.elapsed_time += advance;
        self.advance()
    }

    /// Process elapsed time, crossing as many cycle boundaries as it covers
    ///
    /// The first [`MAX_CYCLES_PER_STEP`] crossings of one step fire their
    /// events; whole cycles beyond that are skipped arithmetically.
    fn advance(&mut self) -> bool {
        let mut crossed = 0u32;
        loop {
            let delay = self
                .core
                .config
                .active_delay(self.core.timing.completed_repeats);
            if self.core.timing.elapsed_time < delay {
                return false;
            }

            let duration = self.cycle_duration();
            if !self.core.timing.has_begun {
                let kind = &mut self.kind;
                self.core.begin_cycle(duration, || kind.on_cycle_start());
            }

            let local = self.core.timing.elapsed_time - delay;
            let delta = local - self.core.cycle_local;
            self.core.cycle_local = local;
            let drive = self.kind.drive(&self.core.config, local, delta);

            // Sequence time only moves as far as its elements consumed it
            if drive == Drive::Running {
                if let AnimationKind::Sequence(sequence) = &self.kind {
                    let consumed = sequence.consumed_ms();
                    let local = self.core.config.time_base().from_millis(consumed);
                    self.core.place_local(local);
                }
            }

            let at_end = drive != Drive::Running;
            self.core.dispatch(PluginCall::Update, duration, at_end);
            self.core.emit(EventKind::Step, duration, at_end);

            let overshoot = match drive {
                Drive::Running => return false,
                Drive::Finished => return self.end_cycle(duration, 0.0, true),
                Drive::CycleDone { overshoot } => overshoot,
            };
            if self.end_cycle(duration, overshoot, false) {
                return true;
            }

            // Zero-length cycles make no progress on their own
            let cycle_length = self.core.config.repeat_delay() + duration;
            let more = if cycle_length > 0.0 {
                overshoot > 0.0
            } else {
                !self.core.config.repeat().is_infinite()
            };
            if !more {
                return false;
            }

            crossed += 1;
            if crossed >= MAX_CYCLES_PER_STEP {
                self.skip_cycles(cycle_length);
            }
        }
    }

    /// Jump over whole cycles covered by the pending elapsed time
    ///
    /// Skipped cycles fire no events. The final cycle of a finite repeat is
    /// always left for the regular path so COMPLETE still fires.
    fn skip_cycles(&mut self, cycle_length: f32) {
        let timing = &mut self.core.timing;
        let remaining = match self.core.config.repeat().count() {
            Some(n) => n
                .saturating_sub(timing.completed_repeats)
                .saturating_sub(1),
            None if cycle_length > 0.0 => u32::MAX - timing.completed_repeats,
            None => return,
        };
        let whole = if cycle_length > 0.0 {
            (timing.elapsed_time as f64 / cycle_length as f64)
                .floor()
                .min(remaining as f64) as u32
        } else {
            remaining
        };
        if whole == 0 {
            return;
        }

        let skipped = whole as f64 * cycle_length.max(0.0) as f64;
        timing.elapsed_time = (timing.elapsed_time as f64 - skipped).max(0.0) as f32;
        timing.completed_repeats = timing.completed_repeats.saturating_add(whole);
        tracing::trace!("Animation {:?} skipped {} cycle(s)", self.core.name, whole);
    }

    /// Close the current cycle; returns `true` when the animation completed
    fn end_cycle(&mut self, duration: f32, overshoot: f32, finished: bool) -> bool {
        self.core.emit(EventKind::End, duration, true);
        let timing = &mut self.core.timing;
        timing.completed_repeats = timing.completed_repeats.saturating_add(1);
        timing.has_begun = false;
        self.core.cycle_local = 0.0;

        let completed = self.core.timing.completed_repeats;
        if finished || !self.core.config.repeat().remains_after(completed) {
            self.core.timing.elapsed_time = 0.0;
            self.core.at_end = true;
            self.core.emit(EventKind::Complete, duration, true);
            self.core.dispatch(PluginCall::End, duration, true);
            self.core.lifecycle = Lifecycle::Stopped;
            tracing::debug!(
                "Animation {:?} completed after {} cycle(s)",
                self.core.name,
                completed
            );
            return true;
        }

        self.core.timing.elapsed_time = overshoot;
        tracing::trace!("Animation {:?} cycle {} ended", self.core.name, completed);
        false
    }

    // =========================================================================
    // Composite access
    // =========================================================================

    pub fn as_parallel(&self) -> Option<&Parallel> {
        match &self.kind {
            AnimationKind::Parallel(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_parallel_mut(&mut self) -> Option<ParallelMut<'_>> {
        match &mut self.kind {
            AnimationKind::Parallel(group) => Some(ParallelMut::new(&mut self.core, group)),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            AnimationKind::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<SequenceMut<'_>> {
        match &mut self.kind {
            AnimationKind::Sequence(sequence) => {
                Some(SequenceMut::new(&mut self.core, sequence))
            }
            _ => None,
        }
    }

    pub fn as_timeline(&self) -> Option<&Timeline> {
        match &self.kind {
            AnimationKind::Timeline(timeline) => Some(timeline),
            _ => None,
        }
    }

    pub fn as_timeline_mut(&mut self) -> Option<TimelineMut<'_>> {
        match &mut self.kind {
            AnimationKind::Timeline(timeline) => {
                Some(TimelineMut::new(&mut self.core, timeline))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.core.name)
            .field("kind", &self.kind.label())
            .field("lifecycle", &self.core.lifecycle)
            .field("timing", &self.core.timing)
            .field("plugins", &self.core.plugins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AnimationBuilder;
    use cadence_core::{PlayMode, Repeat, TimeMode};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<EventKind>>>, impl AnimationListener + 'static) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |e: &AnimationEvent<'_>| {
            sink.lock().unwrap().push(e.kind)
        })
    }

    fn count(events: &Arc<Mutex<Vec<EventKind>>>, kind: EventKind) -> usize {
        events.lock().unwrap().iter().filter(|k| **k == kind).count()
    }

    #[test]
    fn test_stopped_and_paused_step() {
        let mut anim = AnimationBuilder::new().duration(100.0).build().unwrap();
        assert!(anim.step(16.0));

        anim.start();
        anim.pause();
        assert!(!anim.step(50.0));
        assert_eq!(anim.timing_state().elapsed_time, 0.0);

        anim.resume();
        assert!(!anim.step(50.0));
        assert!((anim.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_delay_and_completion() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(500.0)
            .delay(100.0)
            .listener(listener)
            .build()
            .unwrap();
        anim.start();

        assert!(!anim.step(50.0));
        assert!(events.lock().unwrap().is_empty());

        assert!(!anim.step(50.0));
        assert_eq!(
            *events.lock().unwrap(),
            vec![EventKind::Begin, EventKind::Start, EventKind::Step]
        );
        assert_eq!(anim.position(), 0.0);

        assert!(!anim.step(250.0));
        assert!((anim.position() - 0.5).abs() < 1e-6);

        assert!(anim.step(250.0));
        assert_eq!(count(&events, EventKind::End), 1);
        assert_eq!(count(&events, EventKind::Complete), 1);
        assert_eq!(anim.lifecycle(), Lifecycle::Stopped);
        assert_eq!(anim.progress(), 1.0);
        assert!(anim.step(10.0));
    }

    #[test]
    fn test_repeat_delay_between_cycles() {
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .repeat(Repeat::Times(2))
            .repeat_delay(50.0)
            .build()
            .unwrap();
        anim.start();

        // Cycle 0: 50 delay + 100 duration
        assert!(!anim.step(150.0));
        assert_eq!(anim.completed_repeats(), 1);

        assert!(!anim.step(75.0));
        assert!((anim.progress() - 0.25).abs() < 1e-6);

        assert!(anim.step(75.0));
        assert_eq!(anim.completed_repeats(), 2);
    }

    #[test]
    fn test_overshoot_crosses_several_cycles() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .repeat(Repeat::Times(5))
            .listener(listener)
            .build()
            .unwrap();
        anim.start();

        assert!(!anim.step(250.0));
        assert_eq!(anim.completed_repeats(), 2);
        assert!((anim.progress() - 0.5).abs() < 1e-6);
        assert_eq!(count(&events, EventKind::End), 2);
        assert_eq!(count(&events, EventKind::Begin), 1);
        assert_eq!(count(&events, EventKind::Start), 3);
    }

    #[test]
    fn test_zero_duration_completes_past_delay() {
        let mut anim = AnimationBuilder::new()
            .duration(0.0)
            .delay(20.0)
            .build()
            .unwrap();
        anim.start();
        assert!(!anim.step(10.0));
        assert!(anim.step(10.0));
    }

    #[test]
    fn test_infinite_duration_never_completes() {
        let mut anim = AnimationBuilder::new()
            .duration(f32::INFINITY)
            .build()
            .unwrap();
        anim.start();
        for _ in 0..100 {
            assert!(!anim.step(1000.0));
        }
        assert_eq!(anim.progress(), 0.0);
        assert!(anim.span_ms().is_infinite());
    }

    #[test]
    fn test_time_scale_and_seconds() {
        let mut anim = AnimationBuilder::new()
            .time_mode(TimeMode::Seconds)
            .duration(2.0)
            .time_scale(2.0)
            .build()
            .unwrap();
        assert_eq!(anim.span_ms(), 1000.0);

        anim.start();
        anim.step(500.0);
        assert!((anim.progress() - 0.5).abs() < 1e-6);
        assert!((anim.elapsed_span_ms() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_frames_mode_without_fps_uses_default_rate() {
        let mut anim = AnimationBuilder::new()
            .time_mode(TimeMode::Frames)
            .duration(60.0)
            .build()
            .unwrap();
        assert!((anim.span_ms() - 1000.0).abs() < 1e-3);

        anim.start();
        // Less than one frame: nothing reportable
        assert!(!anim.step(10.0));
        assert_eq!(anim.timing_state().elapsed_time, 0.0);
        anim.step(40.0);
        assert_eq!(anim.timing_state().elapsed_time, 3.0);
    }

    #[test]
    fn test_yoyo_position() {
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .play_mode(PlayMode::Yoyo)
            .build()
            .unwrap();
        anim.start();
        anim.step(25.0);
        assert!((anim.position() - 0.5).abs() < 1e-6);
        anim.step(50.0);
        assert!((anim.position() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stop_goto_end() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .listener(listener)
            .build()
            .unwrap();
        anim.start();
        anim.step(30.0);
        anim.stop(true);

        assert_eq!(anim.lifecycle(), Lifecycle::Stopped);
        assert_eq!(anim.progress(), 1.0);
        assert_eq!(count(&events, EventKind::Stop), 1);
        assert_eq!(count(&events, EventKind::Complete), 0);

        // Already stopped
        anim.stop(true);
        assert_eq!(count(&events, EventKind::Stop), 1);
    }

    #[test]
    fn test_restart_and_removal() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .listener(listener)
            .build()
            .unwrap();
        anim.start();
        anim.step(60.0);
        anim.restart();
        assert_eq!(anim.timing_state().elapsed_time, 0.0);
        assert!(anim.is_running());
        assert_eq!(count(&events, EventKind::Restart), 1);

        anim.mark_for_removal();
        assert_eq!(anim.lifecycle(), Lifecycle::PendingRemoval);
        assert!(anim.step(10.0));
        anim.start();
        assert_eq!(anim.lifecycle(), Lifecycle::PendingRemoval);
    }

    #[test]
    fn test_huge_scaled_delta_returns() {
        let mut anim = AnimationBuilder::new()
            .duration(1.0e9)
            .fps(1000)
            .time_scale(1.0e6)
            .build()
            .unwrap();
        anim.start();

        assert!(!anim.step(40.0));
        assert_eq!(anim.timing_state().elapsed_time, 4.0e7);
        assert!((anim.progress() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_many_cycles_in_one_step_are_skipped() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(1.0)
            .repeat(Repeat::Infinite)
            .listener(listener)
            .build()
            .unwrap();
        anim.start();

        assert!(!anim.step(1.0e7));
        assert_eq!(anim.completed_repeats(), 10_000_000);
        assert_eq!(anim.progress(), 0.0);
        assert_eq!(count(&events, EventKind::End), MAX_CYCLES_PER_STEP as usize);
    }

    #[test]
    fn test_skipping_keeps_the_final_cycle() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(1.0)
            .repeat(Repeat::Times(1000))
            .listener(listener)
            .build()
            .unwrap();
        anim.start();

        assert!(anim.step(5000.0));
        assert_eq!(anim.completed_repeats(), 1000);
        assert_eq!(count(&events, EventKind::End), MAX_CYCLES_PER_STEP as usize + 1);
        assert_eq!(count(&events, EventKind::Complete), 1);
        assert_eq!(anim.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn test_seek_fires_no_events() {
        let (events, listener) = recorder();
        let mut anim = AnimationBuilder::new()
            .duration(100.0)
            .repeat(Repeat::Times(3))
            .listener(listener)
            .build()
            .unwrap();
        anim.start();
        anim.seek(250.0);

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(anim.completed_repeats(), 2);
        assert!((anim.progress() - 0.5).abs() < 1e-6);
        assert!((anim.elapsed_span_ms() - 250.0).abs() < 1e-3);
    }
}

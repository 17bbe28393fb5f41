//! Timeline composition
//!
//! Entries start at absolute offsets (in the timeline's time unit) and may
//! overlap. Children are never stepped: whenever the timeline's clock moves,
//! each entry is recomputed from scratch and its child is sought to the
//! matching local time. Scrubbing to the same time twice therefore leaves
//! every child in the same state.

use crate::animation::{Animation, AnimationCore, Drive, Lifecycle, PluginCall};
use crate::error::{CompositionError, Result};
use cadence_core::TimingConfig;
use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Before its offset (or never reached)
    Idle,
    Active,
    /// Finished once; not touched again until the clock moves back
    Done,
}

struct TimelineEntry {
    offset: f32,
    animation: Animation,
    phase: Phase,
}

/// Offset-scheduled children of a timeline
pub struct Timeline {
    entries: IndexMap<String, TimelineEntry>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.entries.get(name).map(|entry| &entry.animation)
    }

    /// Start offset of an entry, in the timeline's unit
    pub fn offset(&self, name: &str) -> Option<f32> {
        self.entries.get(name).map(|entry| entry.offset)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn cycle_duration(&self, config: &TimingConfig) -> f32 {
        let base = config.time_base();
        self.entries
            .values()
            .map(|entry| entry.offset + base.from_millis(entry.animation.span_ms()))
            .fold(0.0, f32::max)
    }

    /// Silently stop every child and forget their phases
    pub(crate) fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.animation.halt();
            entry.phase = Phase::Idle;
        }
    }

    /// Position every child for timeline-local time `local`
    pub(crate) fn sync(&mut self, config: &TimingConfig, local: f32) {
        let base = config.time_base();
        for entry in self.entries.values_mut() {
            let local_ms = base.to_millis(local - entry.offset);
            let span = entry.animation.span_ms();

            if local_ms < 0.0 {
                if entry.phase != Phase::Idle {
                    entry.animation.rewind();
                    entry.phase = Phase::Idle;
                }
            } else if local_ms < span {
                if entry.animation.lifecycle() == Lifecycle::Stopped {
                    entry.animation.start();
                }
                entry.animation.seek_ms(local_ms);
                entry.phase = Phase::Active;
            } else if entry.phase != Phase::Done {
                entry.animation.finish();
                entry.phase = Phase::Done;
            }
        }
    }

    pub(crate) fn drive(&mut self, config: &TimingConfig, local: f32) -> Drive {
        self.sync(config, local);
        let duration = self.cycle_duration(config);
        if local < duration {
            Drive::Running
        } else {
            Drive::CycleDone {
                overshoot: local - duration,
            }
        }
    }
}

/// Mutable access to a timeline together with its owner
pub struct TimelineMut<'a> {
    core: &'a mut AnimationCore,
    timeline: &'a mut Timeline,
}

impl<'a> TimelineMut<'a> {
    pub(crate) fn new(core: &'a mut AnimationCore, timeline: &'a mut Timeline) -> Self {
        Self { core, timeline }
    }

    /// Schedule `animation` at `offset` (timeline unit)
    pub fn add(&mut self, name: impl Into<String>, offset: f32, animation: Animation) -> Result<()> {
        let name = name.into();
        if !offset.is_finite() || offset < 0.0 {
            return Err(CompositionError::InvalidOffset(offset));
        }
        if self.timeline.entries.contains_key(&name) {
            return Err(CompositionError::DuplicateName(name));
        }
        self.timeline.entries.insert(
            name,
            TimelineEntry {
                offset,
                animation,
                phase: Phase::Idle,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Animation> {
        let mut entry = self
            .timeline
            .entries
            .shift_remove(name)
            .ok_or_else(|| CompositionError::UnknownName(name.to_string()))?;
        entry.animation.halt();
        Ok(entry.animation)
    }

    /// Length of one timeline cycle, in the timeline's unit
    pub fn duration(&self) -> f32 {
        self.timeline.cycle_duration(&self.core.config)
    }

    /// Scrub to `time` within the current cycle
    ///
    /// A stopped timeline is started first, firing BEGIN/START once.
    /// Children that pass their end are finished with a stop.
    pub fn set_time(&mut self, time: f32) {
        let duration = self.duration();
        let local = time.clamp(0.0, duration.max(0.0));

        if self.core.lifecycle == Lifecycle::Stopped {
            self.timeline.reset();
            self.core.begin_run(duration);
        }
        if !self.core.timing.has_begun {
            let delay = self.core.config.active_delay(self.core.timing.completed_repeats);
            self.core.timing.elapsed_time = delay;
            let timeline = &mut *self.timeline;
            self.core.begin_cycle(duration, || timeline.reset());
        }

        self.core.at_end = false;
        self.core.place_local(local);
        self.timeline.sync(&self.core.config, local);
        self.core.dispatch(PluginCall::Update, duration, false);
    }

    /// Scrub to a fraction of the cycle
    pub fn set_position(&mut self, position: f32) {
        let duration = self.duration();
        if duration.is_finite() {
            self.set_time(position.clamp(0.0, 1.0) * duration);
        }
    }
}

impl std::ops::Deref for TimelineMut<'_> {
    type Target = Timeline;

    fn deref(&self) -> &Timeline {
        &*self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AnimationBuilder;
    use crate::plugin::{PluginContext, PropertyPlugin};
    use cadence_core::TimeMode;
    use std::sync::{Arc, Mutex};

    fn tween(duration: f32) -> Animation {
        AnimationBuilder::new().duration(duration).build().unwrap()
    }

    fn timeline() -> Animation {
        let mut anim = AnimationBuilder::new().build_timeline().unwrap();
        {
            let mut timeline = anim.as_timeline_mut().unwrap();
            timeline.add("fade", 0.0, tween(200.0)).unwrap();
            timeline.add("slide", 100.0, tween(300.0)).unwrap();
        }
        anim
    }

    #[test]
    fn test_duration_is_latest_end() {
        let mut anim = timeline();
        assert_eq!(anim.cycle_duration(), 400.0);
        assert_eq!(anim.as_timeline_mut().unwrap().duration(), 400.0);
    }

    #[test]
    fn test_set_time_positions_children() {
        let mut anim = timeline();
        anim.as_timeline_mut().unwrap().set_time(250.0);

        let timeline = anim.as_timeline().unwrap();
        let fade = timeline.get("fade").unwrap();
        let slide = timeline.get("slide").unwrap();
        assert_eq!(fade.lifecycle(), Lifecycle::Stopped);
        assert_eq!(fade.progress(), 1.0);
        assert!(slide.is_running());
        assert!((slide.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_set_time_is_idempotent() {
        let mut anim = timeline();
        anim.as_timeline_mut().unwrap().set_time(150.0);
        let first = *anim.as_timeline().unwrap().get("slide").unwrap().timing_state();

        anim.as_timeline_mut().unwrap().set_time(150.0);
        let second = *anim.as_timeline().unwrap().get("slide").unwrap().timing_state();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scrub_back_before_offset_rewinds() {
        let mut anim = timeline();
        let mut timeline = anim.as_timeline_mut().unwrap();
        timeline.set_time(300.0);
        timeline.set_time(50.0);

        let slide = timeline.get("slide").unwrap();
        assert_eq!(slide.lifecycle(), Lifecycle::Stopped);
        assert_eq!(slide.timing_state().elapsed_time, 0.0);
    }

    #[test]
    fn test_stepping_runs_to_completion() {
        let mut anim = timeline();
        anim.start();
        assert!(!anim.step(250.0));
        assert!((anim.progress() - 0.625).abs() < 1e-6);
        assert!(anim.step(150.0));

        let timeline = anim.as_timeline().unwrap();
        assert_eq!(timeline.get("slide").unwrap().progress(), 1.0);
    }

    struct PositionLog(Arc<Mutex<Vec<f32>>>);

    impl PropertyPlugin for PositionLog {
        fn update(&mut self, ctx: &PluginContext<'_>) {
            self.0.lock().unwrap().push(ctx.position);
        }
    }

    #[test]
    fn test_set_time_starts_stopped_timeline() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut anim = AnimationBuilder::new()
            .plugin(PositionLog(seen.clone()))
            .build_timeline()
            .unwrap();
        {
            let mut timeline = anim.as_timeline_mut().unwrap();
            timeline.add("fade", 0.0, tween(200.0)).unwrap();
            timeline.add("slide", 100.0, tween(300.0)).unwrap();
        }
        assert_eq!(anim.lifecycle(), Lifecycle::Stopped);

        anim.as_timeline_mut().unwrap().set_time(200.0);
        assert_eq!(anim.lifecycle(), Lifecycle::Running);
        assert!((anim.progress() - 0.5).abs() < 1e-6);
        assert_eq!(*seen.lock().unwrap(), vec![0.5]);

        // Stepping carries on from the scrubbed time
        assert!(anim.step(200.0));
    }

    #[test]
    fn test_scaled_timeline_steps_children_in_wall_clock() {
        let mut anim = AnimationBuilder::new()
            .time_scale(2.0)
            .build_timeline()
            .unwrap();
        anim.as_timeline_mut()
            .unwrap()
            .add("a", 100.0, tween(200.0))
            .unwrap();
        assert_eq!(anim.span_ms(), 150.0);

        anim.start();
        assert!(!anim.step(100.0));
        let child = anim.as_timeline().unwrap().get("a").unwrap();
        assert!((child.progress() - 0.5).abs() < 1e-6);

        assert!(anim.step(50.0));
        assert_eq!(anim.as_timeline().unwrap().get("a").unwrap().progress(), 1.0);
    }

    #[test]
    fn test_frames_timeline() {
        let mut anim = AnimationBuilder::new()
            .time_mode(TimeMode::Frames)
            .build_timeline()
            .unwrap();
        // 30 frames at the default 60 fps is 500 ms
        anim.as_timeline_mut()
            .unwrap()
            .add("late", 30.0, tween(500.0))
            .unwrap();
        assert_eq!(anim.cycle_duration(), 60.0);
        assert!((anim.span_ms() - 1000.0).abs() < 1e-3);

        anim.start();
        assert!(!anim.step(250.0));
        let late = anim.as_timeline().unwrap().get("late").unwrap();
        assert_eq!(late.lifecycle(), Lifecycle::Stopped);

        assert!(!anim.step(500.0));
        let late = anim.as_timeline().unwrap().get("late").unwrap();
        assert!(late.is_running());
        assert!((late.progress() - 0.5).abs() < 1e-5);

        assert!(anim.step(250.0));
    }

    #[test]
    fn test_invalid_offset() {
        let mut anim = AnimationBuilder::new().build_timeline().unwrap();
        let err = anim
            .as_timeline_mut()
            .unwrap()
            .add("late", -1.0, tween(10.0))
            .unwrap_err();
        assert_eq!(err, CompositionError::InvalidOffset(-1.0));
    }
}

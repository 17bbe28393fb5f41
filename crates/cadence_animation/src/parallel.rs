//! Parallel composition
//!
//! Runs named children side by side. The group converts its own local
//! advance back to milliseconds and steps every child with it; each child
//! applies its own unit conversion and time scale.

use crate::animation::{Animation, AnimationCore, Drive, Lifecycle};
use crate::error::{CompositionError, Result};
use cadence_core::TimingConfig;
use indexmap::IndexMap;

/// When a parallel group's cycle ends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParallelCompletion {
    /// The cycle lasts as long as the longest child span
    #[default]
    AllChildren,
    /// The group's own duration ends the cycle; unfinished children are stopped
    OwnDuration,
}

/// Children of a parallel group
pub struct Parallel {
    children: IndexMap<String, Animation>,
    completion: ParallelCompletion,
}

impl Parallel {
    pub(crate) fn new(completion: ParallelCompletion) -> Self {
        Self {
            children: IndexMap::new(),
            completion,
        }
    }

    pub fn completion(&self) -> ParallelCompletion {
        self.completion
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.children.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Longest child span in milliseconds
    pub fn longest_span_ms(&self) -> f32 {
        self.children
            .values()
            .map(Animation::span_ms)
            .fold(0.0, f32::max)
    }

    pub(crate) fn cycle_duration(&self, config: &TimingConfig) -> f32 {
        match self.completion {
            ParallelCompletion::AllChildren => {
                config.time_base().from_millis(self.longest_span_ms())
            }
            ParallelCompletion::OwnDuration => config.duration(),
        }
    }

    pub(crate) fn restart_children(&mut self) {
        for child in self.children.values_mut() {
            child.halt();
            child.start();
        }
    }

    pub(crate) fn halt_children(&mut self) {
        for child in self.children.values_mut() {
            child.halt();
        }
    }

    pub(crate) fn finish_children(&mut self) {
        for child in self.children.values_mut() {
            child.finish();
        }
    }

    pub(crate) fn drive(&mut self, config: &TimingConfig, local: f32, delta: f32) -> Drive {
        let delta_ms = config.time_base().to_millis(delta);
        let mut all_finished = true;
        for child in self.children.values_mut() {
            if !child.step(delta_ms) {
                all_finished = false;
            }
        }

        let duration = self.cycle_duration(config);
        match self.completion {
            ParallelCompletion::AllChildren => {
                if !all_finished && local < duration {
                    return Drive::Running;
                }
                // Rounding can leave the longest child a hair short
                for child in self.children.values_mut() {
                    if child.lifecycle() != Lifecycle::Stopped {
                        child.stop(true);
                    }
                }
            }
            ParallelCompletion::OwnDuration => {
                if local < duration {
                    return Drive::Running;
                }
                for child in self.children.values_mut() {
                    child.stop(false);
                }
            }
        }
        Drive::CycleDone {
            overshoot: (local - duration).max(0.0),
        }
    }

    pub(crate) fn seek_ms(&mut self, local_ms: f32) {
        for child in self.children.values_mut() {
            if child.lifecycle() == Lifecycle::Stopped && local_ms < child.span_ms() {
                child.start();
            }
            child.seek_ms(local_ms);
        }
    }
}

/// Mutable access to a parallel group together with its owner
pub struct ParallelMut<'a> {
    core: &'a mut AnimationCore,
    group: &'a mut Parallel,
}

impl<'a> ParallelMut<'a> {
    pub(crate) fn new(core: &'a mut AnimationCore, group: &'a mut Parallel) -> Self {
        Self { core, group }
    }

    /// Add a child; it joins immediately when the group's cycle is under way
    pub fn add(&mut self, name: impl Into<String>, mut animation: Animation) -> Result<()> {
        let name = name.into();
        if self.group.children.contains_key(&name) {
            return Err(CompositionError::DuplicateName(name));
        }
        if self.core.lifecycle == Lifecycle::Running && self.core.timing.has_begun {
            animation.start();
        }
        self.group.children.insert(name, animation);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Animation> {
        let mut child = self
            .group
            .children
            .shift_remove(name)
            .ok_or_else(|| CompositionError::UnknownName(name.to_string()))?;
        child.halt();
        Ok(child)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Animation> {
        self.group.children.get_mut(name)
    }
}

impl std::ops::Deref for ParallelMut<'_> {
    type Target = Parallel;

    fn deref(&self) -> &Parallel {
        &*self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AnimationBuilder;
    use cadence_core::{Repeat, TimeMode};

    fn tween(duration: f32) -> Animation {
        AnimationBuilder::new().duration(duration).build().unwrap()
    }

    fn group(completion: ParallelCompletion) -> Animation {
        let mut anim = AnimationBuilder::new()
            .duration(150.0)
            .build_parallel(completion)
            .unwrap();
        {
            let mut group = anim.as_parallel_mut().unwrap();
            group.add("short", tween(100.0)).unwrap();
            group.add("long", tween(300.0)).unwrap();
        }
        anim
    }

    #[test]
    fn test_all_children_waits_for_longest() {
        let mut anim = group(ParallelCompletion::AllChildren);
        assert_eq!(anim.cycle_duration(), 300.0);
        anim.start();

        assert!(!anim.step(150.0));
        let parallel = anim.as_parallel().unwrap();
        assert_eq!(parallel.get("short").unwrap().lifecycle(), Lifecycle::Stopped);
        assert!(parallel.get("long").unwrap().is_running());
        assert!((anim.progress() - 0.5).abs() < 1e-6);

        assert!(anim.step(150.0));
    }

    #[test]
    fn test_own_duration_stops_children() {
        let mut anim = group(ParallelCompletion::OwnDuration);
        assert_eq!(anim.cycle_duration(), 150.0);
        anim.start();

        assert!(anim.step(150.0));
        let long = anim.as_parallel().unwrap().get("long").unwrap();
        assert_eq!(long.lifecycle(), Lifecycle::Stopped);
        assert!((long.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_children_restart_each_cycle() {
        let mut anim = AnimationBuilder::new()
            .repeat(Repeat::Times(2))
            .build_parallel(ParallelCompletion::AllChildren)
            .unwrap();
        anim.as_parallel_mut()
            .unwrap()
            .add("only", tween(100.0))
            .unwrap();
        anim.start();

        assert!(!anim.step(150.0));
        assert_eq!(anim.completed_repeats(), 1);
        let child = anim.as_parallel().unwrap().get("only").unwrap();
        assert!(child.is_running());
        assert!((child.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_child_units_convert_through_millis() {
        let mut anim = AnimationBuilder::new()
            .time_mode(TimeMode::Seconds)
            .build_parallel(ParallelCompletion::AllChildren)
            .unwrap();
        let child = AnimationBuilder::new()
            .duration(500.0)
            .build()
            .unwrap();
        anim.as_parallel_mut().unwrap().add("ms", child).unwrap();

        assert!((anim.cycle_duration() - 0.5).abs() < 1e-6);
        anim.start();
        anim.step(250.0);
        let child = anim.as_parallel().unwrap().get("ms").unwrap();
        assert!((child.progress() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let mut anim = group(ParallelCompletion::AllChildren);
        let err = anim
            .as_parallel_mut()
            .unwrap()
            .add("short", tween(10.0))
            .unwrap_err();
        assert_eq!(err, CompositionError::DuplicateName("short".into()));
    }
}

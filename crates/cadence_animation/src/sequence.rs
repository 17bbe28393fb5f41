//! Sequence (queue) composition
//!
//! Plays named elements one after another. The sequence hands its whole
//! advance to the current element; when that element completes, the
//! leftover time flows into the next one. The end of the chain ends the
//! sequence's cycle, and the sequence's own repeat wraps back to the first
//! element.
//!
//! The sequence keeps `cumulative_ms` (spans of the elements before the
//! current one) and `total_ms` (spans of every element) up to date on every
//! insert and remove, so the sequence's length never has to be recomputed
//! while it plays.

use crate::animation::{Animation, AnimationCore, Drive, Lifecycle, PluginCall};
use crate::error::{CompositionError, Result};
use cadence_core::TimingConfig;
use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    /// Nothing plays; `current` is the next element to play
    Idle,
    Playing,
    /// Chain finished for this cycle
    Exhausted,
}

/// Ordered, named elements of a sequence
pub struct Sequence {
    elements: IndexMap<String, Animation>,
    current: usize,
    cursor: Cursor,
    cumulative_ms: f32,
    total_ms: f32,
    one_run: bool,
    /// Element to start from once the sequence's delay has passed
    pending: Option<usize>,
    next_id: usize,
}

impl Sequence {
    pub(crate) fn new(one_run: bool) -> Self {
        Self {
            elements: IndexMap::new(),
            current: 0,
            cursor: Cursor::Idle,
            cumulative_ms: 0.0,
            total_ms: 0.0,
            one_run,
            pending: None,
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of every element's span, in milliseconds
    pub fn total_ms(&self) -> f32 {
        self.total_ms
    }

    /// Milliseconds consumed in the current cycle
    pub fn consumed_ms(&self) -> f32 {
        match self.cursor {
            Cursor::Playing => self.cumulative_ms + self.current_element_elapsed(),
            Cursor::Idle => self.cumulative_ms,
            Cursor::Exhausted => self.total_ms,
        }
    }

    /// Index of the element that is playing
    pub fn current_index(&self) -> Option<usize> {
        (self.cursor == Cursor::Playing).then_some(self.current)
    }

    pub fn current_name(&self) -> Option<&str> {
        let index = self.current_index()?;
        self.elements.get_index(index).map(|(name, _)| name.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.cursor == Cursor::Idle
    }

    pub fn one_run(&self) -> bool {
        self.one_run
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.elements.get(name)
    }

    pub fn get_index(&self, index: usize) -> Option<(&str, &Animation)> {
        self.elements
            .get_index(index)
            .map(|(name, anim)| (name.as_str(), anim))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.elements.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    fn current_element_elapsed(&self) -> f32 {
        self.elements
            .get_index(self.current)
            .map(|(_, element)| element.elapsed_span_ms())
            .unwrap_or(0.0)
    }

    fn spans_before(&self, index: usize) -> f32 {
        self.elements
            .values()
            .take(index)
            .map(Animation::span_ms)
            .sum()
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub(crate) fn reset(&mut self) {
        self.halt_all();
        self.current = 0;
        self.cursor = Cursor::Idle;
        self.cumulative_ms = 0.0;
        self.pending = None;
    }

    pub(crate) fn halt_all(&mut self) {
        for element in self.elements.values_mut() {
            element.halt();
        }
    }

    pub(crate) fn on_cycle_start(&mut self) {
        self.halt_all();
        let index = self.pending.take().unwrap_or(0);
        if index < self.elements.len() {
            self.play(index);
        } else {
            self.current = 0;
            self.cumulative_ms = 0.0;
            self.cursor = Cursor::Exhausted;
        }
    }

    /// Make `index` the current element and start it fresh
    fn play(&mut self, index: usize) {
        self.cumulative_ms = self.spans_before(index);
        self.current = index;
        self.cursor = Cursor::Playing;
        if let Some((_, element)) = self.elements.get_index_mut(index) {
            element.halt();
            element.start();
        }
    }

    fn end_of_chain(&self, leftover_ms: f32, config: &TimingConfig) -> Drive {
        if self.one_run {
            Drive::Finished
        } else {
            Drive::CycleDone {
                overshoot: config.time_base().from_millis(leftover_ms),
            }
        }
    }

    pub(crate) fn drive(&mut self, config: &TimingConfig, delta: f32) -> Drive {
        let mut remaining = config.time_base().to_millis(delta);
        if self.elements.is_empty() || self.cursor == Cursor::Exhausted {
            self.cursor = Cursor::Exhausted;
            return self.end_of_chain(remaining.max(0.0), config);
        }

        loop {
            if self.cursor != Cursor::Playing {
                return Drive::Running;
            }
            let Some((_, element)) = self.elements.get_index_mut(self.current) else {
                self.cursor = Cursor::Exhausted;
                return self.end_of_chain(remaining, config);
            };

            let before = element.elapsed_span_ms();
            if !element.step(remaining) {
                return Drive::Running;
            }
            let span = element.span_ms();
            remaining = (remaining - (span - before).max(0.0)).max(0.0);
            self.cumulative_ms += span;

            if self.one_run || self.current + 1 >= self.elements.len() {
                self.cursor = Cursor::Exhausted;
                return self.end_of_chain(remaining, config);
            }
            let next = self.current + 1;
            self.play(next);
        }
    }

    /// Place the sequence at `target_ms` into the current cycle
    pub(crate) fn seek_ms(&mut self, target_ms: f32) {
        let len = self.elements.len();
        if len == 0 {
            return;
        }
        let target = target_ms.clamp(0.0, self.total_ms);

        let mut start = 0.0;
        let mut index = 0;
        for (i, element) in self.elements.values().enumerate() {
            index = i;
            let span = element.span_ms();
            if target < start + span || i + 1 == len {
                break;
            }
            start += span;
        }

        let replaying = self.cursor == Cursor::Playing && self.current == index;
        if !replaying {
            if self.cursor == Cursor::Playing {
                if let Some((_, element)) = self.elements.get_index_mut(self.current) {
                    element.halt();
                }
            }
            self.play(index);
        }
        self.cumulative_ms = start;
        if let Some((_, element)) = self.elements.get_index_mut(index) {
            if element.lifecycle() == Lifecycle::Stopped {
                element.start();
            }
            element.seek_ms(target - start);
        }
    }

    /// Force every element from the current one on to its end state
    pub(crate) fn finish_remaining(&mut self) {
        let from = match self.cursor {
            Cursor::Exhausted => return,
            Cursor::Idle | Cursor::Playing => self.current,
        };
        for (_, element) in self.elements.iter_mut().skip(from) {
            element.finish();
        }
        self.cumulative_ms = self.total_ms;
        self.cursor = Cursor::Exhausted;
    }
}

/// Mutable access to a sequence together with its owner
///
/// Every mutation keeps the owner's elapsed time in line with the
/// sequence's bookkeeping.
pub struct SequenceMut<'a> {
    core: &'a mut AnimationCore,
    sequence: &'a mut Sequence,
}

impl<'a> SequenceMut<'a> {
    pub(crate) fn new(core: &'a mut AnimationCore, sequence: &'a mut Sequence) -> Self {
        Self { core, sequence }
    }

    fn duration(&self) -> f32 {
        self.core
            .config
            .time_base()
            .from_millis(self.sequence.total_ms)
    }

    fn resync(&mut self) {
        if self.core.timing.has_begun {
            let consumed = self.sequence.consumed_ms();
            let local = self.core.config.time_base().from_millis(consumed);
            self.core.place_local(local);
        }
    }

    fn ensure_started(&mut self) {
        if self.core.lifecycle == Lifecycle::Stopped {
            self.sequence.reset();
            let duration = self.duration();
            self.core.begin_run(duration);
        }
    }

    pub fn set_one_run(&mut self, one_run: bool) {
        self.sequence.one_run = one_run;
    }

    /// Append an element, auto-naming it when `name` is `None`
    ///
    /// Returns the element's name.
    pub fn push(&mut self, name: Option<String>, animation: Animation) -> Result<String> {
        let len = self.sequence.elements.len();
        self.insert(len, name, animation)
    }

    pub fn insert(
        &mut self,
        index: usize,
        name: Option<String>,
        animation: Animation,
    ) -> Result<String> {
        let len = self.sequence.elements.len();
        if index > len {
            return Err(CompositionError::IndexOutOfRange { index, len });
        }
        let name = match name {
            Some(name) if self.sequence.elements.contains_key(&name) => {
                return Err(CompositionError::DuplicateName(name));
            }
            Some(name) => name,
            None => loop {
                let candidate = format!("element-{}", self.sequence.next_id);
                self.sequence.next_id += 1;
                if !self.sequence.elements.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        let span = animation.span_ms();
        if span.is_infinite() {
            tracing::warn!("Sequence {:?}: rejected infinite element {}", self.core.name, name);
            return Err(CompositionError::InfiniteElement(name));
        }

        let sequence = &mut *self.sequence;
        sequence.elements.shift_insert(index, name.clone(), animation);
        sequence.total_ms += span;
        let shifts = match sequence.cursor {
            Cursor::Playing => index <= sequence.current,
            Cursor::Idle => index < sequence.current,
            Cursor::Exhausted => false,
        };
        if shifts {
            sequence.current += 1;
            sequence.cumulative_ms += span;
        }
        if let Some(pending) = sequence.pending.as_mut() {
            if index <= *pending {
                *pending += 1;
            }
        }
        self.resync();
        Ok(name)
    }

    /// Remove the element at `index`
    ///
    /// Removing the playing element leaves the sequence idle until
    /// [`start_at`](Self::start_at) or [`next`](Self::next) is called.
    pub fn remove(&mut self, index: usize) -> Result<Animation> {
        let len = self.sequence.elements.len();
        let (_, mut removed) = self
            .sequence
            .elements
            .shift_remove_index(index)
            .ok_or(CompositionError::IndexOutOfRange { index, len })?;

        let span = removed.span_ms();
        let sequence = &mut *self.sequence;
        sequence.total_ms -= span;
        if sequence.cursor != Cursor::Exhausted {
            if index < sequence.current {
                sequence.current -= 1;
                sequence.cumulative_ms -= span;
            } else if index == sequence.current && sequence.cursor == Cursor::Playing {
                sequence.cursor = Cursor::Idle;
            }
        }
        sequence.pending = match sequence.pending {
            Some(p) if p == index => None,
            Some(p) if p > index => Some(p - 1),
            other => other,
        };
        removed.halt();
        self.resync();
        Ok(removed)
    }

    pub fn remove_named(&mut self, name: &str) -> Result<Animation> {
        let index = self
            .sequence
            .index_of(name)
            .ok_or_else(|| CompositionError::UnknownName(name.to_string()))?;
        self.remove(index)
    }

    /// Jump to the element at `index`, starting the sequence if needed
    pub fn start_at(&mut self, index: usize) -> Result<()> {
        let len = self.sequence.elements.len();
        if index >= len {
            return Err(CompositionError::IndexOutOfRange { index, len });
        }
        self.ensure_started();
        if !self.core.timing.has_begun {
            self.sequence.pending = Some(index);
            return Ok(());
        }

        if self.sequence.cursor == Cursor::Playing {
            let current = self.sequence.current;
            if let Some((_, element)) = self.sequence.elements.get_index_mut(current) {
                element.stop(false);
            }
        }
        self.sequence.play(index);
        self.resync();
        Ok(())
    }

    pub fn start_at_named(&mut self, name: &str) -> Result<()> {
        let index = self
            .sequence
            .index_of(name)
            .ok_or_else(|| CompositionError::UnknownName(name.to_string()))?;
        self.start_at(index)
    }

    /// Manually advance to the following element
    ///
    /// Returns `false` when the chain is exhausted; the sequence's cycle
    /// then ends on its next step.
    pub fn next(&mut self) -> bool {
        let sequence = &*self.sequence;
        let target = match sequence.cursor {
            Cursor::Exhausted => return false,
            Cursor::Idle => sequence.current,
            Cursor::Playing if sequence.one_run => sequence.len(),
            Cursor::Playing => sequence.current + 1,
        };
        if target < sequence.len() {
            return self.start_at(target).is_ok();
        }

        if self.sequence.cursor == Cursor::Playing {
            let current = self.sequence.current;
            if let Some((_, element)) = self.sequence.elements.get_index_mut(current) {
                element.stop(false);
            }
        }
        self.sequence.cumulative_ms = self.sequence.total_ms;
        self.sequence.cursor = Cursor::Exhausted;
        self.resync();
        false
    }

    /// Jump to a fraction of the sequence's total length
    pub fn set_position(&mut self, position: f32) {
        self.ensure_started();
        let duration = self.duration();
        if !self.core.timing.has_begun {
            let delay = self.core.config.active_delay(self.core.timing.completed_repeats);
            self.core.timing.elapsed_time = delay;
            let sequence = &mut *self.sequence;
            self.core.begin_cycle(duration, || sequence.on_cycle_start());
        }

        let target = position.clamp(0.0, 1.0) * self.sequence.total_ms;
        self.sequence.seek_ms(target);
        self.core.at_end = false;
        self.resync();
        self.core.dispatch(PluginCall::Update, duration, false);
    }
}

impl std::ops::Deref for SequenceMut<'_> {
    type Target = Sequence;

    fn deref(&self) -> &Sequence {
        &*self.sequence
    }
}

//! Property plugins
//!
//! A [`PropertyPlugin`] writes interpolated values into some host object.
//! The animation state machine calls it at fixed lifecycle points:
//!
//! - `initialize` when the animation starts (bind to the target)
//! - `begin` when the initial delay is first crossed (capture start values)
//! - `update` on every reportable step
//! - `end` on completion, stop or removal (release resources)
//!
//! A [`PluginSet`] fans each call out to its members. A member whose
//! `initialize` failed is flagged and skipped until the next `initialize`,
//! so one bad plugin never aborts the rest of the set.

use crate::error::PluginError;
use smallvec::SmallVec;

/// Snapshot of the owning animation, handed to every plugin call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluginContext<'a> {
    /// Name of the owning animation
    pub name: Option<&'a str>,
    /// Direction- and easing-adjusted position (may overshoot `[0, 1]`)
    pub position: f32,
    /// Linear progress through the current cycle, `[0, 1]`
    pub progress: f32,
    /// Time since the start of the current cycle window, in the animation's unit
    pub elapsed: f32,
    pub completed_repeats: u32,
    /// The animation has been forced to, or naturally reached, the end of a cycle
    pub at_end: bool,
}

/// Capability set of a property adapter
pub trait PropertyPlugin: Send {
    /// Bind to the target
    ///
    /// An error disables this plugin until the animation is started again.
    fn initialize(&mut self, _ctx: &PluginContext<'_>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Capture the current value as the interpolation start
    fn begin(&mut self, _ctx: &PluginContext<'_>) {}

    /// Write the value for `ctx.position`
    fn update(&mut self, ctx: &PluginContext<'_>);

    /// Release resources
    fn end(&mut self, _ctx: &PluginContext<'_>) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    /// Not initialized, or released by `end`
    Idle,
    Ready,
    Failed,
}

struct PluginSlot {
    plugin: Box<dyn PropertyPlugin>,
    state: SlotState,
}

/// Aggregates zero or more plugins and fans lifecycle calls out to them
#[derive(Default)]
pub struct PluginSet {
    slots: SmallVec<[PluginSlot; 2]>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P: PropertyPlugin + 'static>(&mut self, plugin: P) {
        self.push_boxed(Box::new(plugin));
    }

    pub fn push_boxed(&mut self, plugin: Box<dyn PropertyPlugin>) {
        self.slots.push(PluginSlot {
            plugin,
            state: SlotState::Idle,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of plugins disabled by a failed `initialize`
    pub fn failed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Failed)
            .count()
    }

    /// Number of plugins bound and receiving updates
    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Ready)
            .count()
    }

    pub fn initialize(&mut self, ctx: &PluginContext<'_>) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.state = match slot.plugin.initialize(ctx) {
                Ok(()) => SlotState::Ready,
                Err(err) => {
                    tracing::warn!(
                        "Animation {:?}: plugin {} disabled: {}",
                        ctx.name,
                        index,
                        err
                    );
                    SlotState::Failed
                }
            };
        }
    }

    pub fn begin(&mut self, ctx: &PluginContext<'_>) {
        for slot in self.ready_mut() {
            slot.plugin.begin(ctx);
        }
    }

    pub fn update(&mut self, ctx: &PluginContext<'_>) {
        for slot in self.ready_mut() {
            slot.plugin.update(ctx);
        }
    }

    /// Release every bound plugin; they stay idle until the next `initialize`
    pub fn end(&mut self, ctx: &PluginContext<'_>) {
        for slot in self.slots.iter_mut() {
            if slot.state == SlotState::Ready {
                slot.plugin.end(ctx);
            }
            slot.state = SlotState::Idle;
        }
    }

    fn ready_mut(&mut self) -> impl Iterator<Item = &mut PluginSlot> {
        self.slots
            .iter_mut()
            .filter(|s| s.state == SlotState::Ready)
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("len", &self.len())
            .field("ready", &self.ready_count())
            .field("failed", &self.failed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl PropertyPlugin for Recorder {
        fn initialize(&mut self, _ctx: &PluginContext<'_>) -> Result<(), PluginError> {
            if self.fail {
                return Err(PluginError::PropertyNotFound("missing".into()));
            }
            self.log.lock().unwrap().push("init".into());
            Ok(())
        }

        fn begin(&mut self, _ctx: &PluginContext<'_>) {
            self.log.lock().unwrap().push("begin".into());
        }

        fn update(&mut self, ctx: &PluginContext<'_>) {
            self.log
                .lock()
                .unwrap()
                .push(format!("update {:.1}", ctx.position));
        }

        fn end(&mut self, _ctx: &PluginContext<'_>) {
            self.log.lock().unwrap().push("end".into());
        }
    }

    fn ctx(position: f32) -> PluginContext<'static> {
        PluginContext {
            name: Some("test"),
            position,
            progress: position,
            elapsed: 0.0,
            completed_repeats: 0,
            at_end: false,
        }
    }

    #[test]
    fn test_failed_plugin_is_skipped() {
        let good_log = Arc::new(Mutex::new(Vec::new()));
        let bad_log = Arc::new(Mutex::new(Vec::new()));

        let mut set = PluginSet::new();
        set.push(Recorder {
            log: bad_log.clone(),
            fail: true,
        });
        set.push(Recorder {
            log: good_log.clone(),
            fail: false,
        });

        set.initialize(&ctx(0.0));
        assert_eq!(set.failed_count(), 1);
        assert_eq!(set.ready_count(), 1);

        set.begin(&ctx(0.0));
        set.update(&ctx(0.5));
        set.end(&ctx(1.0));

        assert!(bad_log.lock().unwrap().is_empty());
        assert_eq!(
            *good_log.lock().unwrap(),
            vec!["init", "begin", "update 0.5", "end"]
        );
    }

    #[test]
    fn test_end_releases_until_reinitialized() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set = PluginSet::new();
        set.push(Recorder {
            log: log.clone(),
            fail: false,
        });

        set.initialize(&ctx(0.0));
        set.end(&ctx(0.0));
        set.update(&ctx(0.5));
        assert_eq!(*log.lock().unwrap(), vec!["init", "end"]);
        assert_eq!(set.ready_count(), 0);
    }
}

//! Animation scheduler
//!
//! The [`Animator`] owns every top-level animation and steps them once per
//! tick. It can be driven by the caller ([`Animator::tick`] from the wall
//! clock, [`Animator::advance`] with an explicit delta) or moved onto a
//! dedicated background thread with [`Animator::start_background`].
//!
//! Other threads never touch the iteration list. They talk to the animator
//! through an [`AnimatorHandle`], which stages additions, removals and
//! commands in a shared area; the ticker applies them at the barrier that
//! closes every tick, after all animations were stepped.
//!
//! # Example
//!
//! ```
//! use cadence_animation::{AnimationBuilder, Animator};
//!
//! let mut animator = Animator::new();
//! let handle = animator.handle();
//!
//! let id = handle
//!     .add(AnimationBuilder::new().duration(100.0).build().unwrap())
//!     .unwrap();
//!
//! animator.advance(0.0).unwrap(); // barrier: the animation is added and started
//! animator.advance(50.0).unwrap();
//! assert!((handle.status(id).unwrap().progress - 0.5).abs() < 1e-6);
//! ```

use crate::animation::{Animation, Lifecycle};
use crate::error::AnimatorError;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ============================================================================
// Process-wide Default
// ============================================================================

static DEFAULT_ANIMATOR: OnceLock<AnimatorHandle> = OnceLock::new();

/// Install the process-wide default animator handle
///
/// Fails if a default was already installed.
pub fn install_default(handle: AnimatorHandle) -> Result<(), AnimatorError> {
    DEFAULT_ANIMATOR
        .set(handle)
        .map_err(|_| AnimatorError::DefaultAlreadyInstalled)
}

/// The process-wide default animator handle, if one was installed
pub fn default_animator() -> Option<AnimatorHandle> {
    DEFAULT_ANIMATOR.get().cloned()
}

// ============================================================================
// Configuration
// ============================================================================

/// Animator configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimatorConfig {
    /// Background tick rate (0 = as fast as possible, yielding between ticks)
    pub fps: u32,
    /// Name of the background thread
    pub name: String,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            name: "cadence-animator".to_string(),
        }
    }
}

impl AnimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ============================================================================
// Shared State
// ============================================================================

/// Identifier of a scheduled animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl AnimationId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        AnimationId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Snapshot of one animation, published at every barrier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationStatus {
    pub lifecycle: Lifecycle,
    pub progress: f32,
    pub position: f32,
    pub completed_repeats: u32,
}

impl AnimationStatus {
    fn of(animation: &Animation) -> Self {
        Self {
            lifecycle: animation.lifecycle(),
            progress: animation.progress(),
            position: animation.position(),
            completed_repeats: animation.completed_repeats(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Command {
    Pause(AnimationId),
    Resume(AnimationId),
    Stop(AnimationId, bool),
    Restart(AnimationId),
}

#[derive(Default)]
struct Staged {
    additions: Vec<(AnimationId, Animation)>,
    removals: Vec<AnimationId>,
    commands: Vec<Command>,
}

/// State shared between the ticker, the animator and its handles
struct Shared {
    staged: Mutex<Staged>,
    snapshots: Mutex<FxHashMap<AnimationId, AnimationStatus>>,
    /// Cleared while the animator is paused
    running: AtomicBool,
    /// Asks the background thread to exit
    stop: AtomicBool,
    fps: AtomicU32,
}

impl Shared {
    fn new(fps: u32) -> Self {
        Self {
            staged: Mutex::new(Staged::default()),
            snapshots: Mutex::new(FxHashMap::default()),
            running: AtomicBool::new(true),
            stop: AtomicBool::new(false),
            fps: AtomicU32::new(fps),
        }
    }

    fn staged(&self) -> MutexGuard<'_, Staged> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshots(&self) -> MutexGuard<'_, FxHashMap<AnimationId, AnimationStatus>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, animation: Animation) -> AnimationId {
        let id = AnimationId::next();
        self.staged().additions.push((id, animation));
        id
    }

    fn remove(&self, id: AnimationId) {
        self.staged().removals.push(id);
    }

    fn command(&self, command: Command) {
        self.staged().commands.push(command);
    }
}

// ============================================================================
// Ticker
// ============================================================================

/// The iteration list and the per-tick algorithm
///
/// Lives inside the [`Animator`], or on the background thread while one runs.
pub struct Ticker {
    shared: Arc<Shared>,
    animations: IndexMap<AnimationId, Animation>,
    last_tick: Option<Instant>,
}

impl Ticker {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            animations: IndexMap::new(),
            last_tick: None,
        }
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Tick with the wall-clock time since the previous tick
    pub fn tick(&mut self) {
        let now = Instant::now();
        let dt_ms = match self.last_tick {
            Some(last) => now.duration_since(last).as_secs_f32() * 1000.0,
            None => 0.0,
        };
        // While paused the clock keeps moving, so no catch-up burst on resume
        self.last_tick = Some(now);
        self.advance(dt_ms);
    }

    /// Tick with an explicit delta in milliseconds
    pub fn advance(&mut self, dt_ms: f32) {
        let mut finished = Vec::new();
        if self.shared.running.load(Ordering::Acquire) {
            for (id, animation) in self.animations.iter_mut() {
                match panic::catch_unwind(AssertUnwindSafe(|| animation.step(dt_ms))) {
                    Ok(true) => finished.push(*id),
                    Ok(false) => {}
                    Err(_) => {
                        tracing::error!(
                            "Animation {:?} ({:?}) panicked during step; removing it",
                            id,
                            animation.name()
                        );
                        finished.push(*id);
                    }
                }
            }
        }
        self.barrier(finished);
    }

    /// Apply everything staged during the tick
    fn barrier(&mut self, finished: Vec<AnimationId>) {
        for id in finished {
            if self.animations.shift_remove(&id).is_some() {
                tracing::trace!("Reaped animation {:?}", id);
            }
        }
        self.animations
            .retain(|_, animation| animation.lifecycle() != Lifecycle::PendingRemoval);

        let staged = std::mem::take(&mut *self.shared.staged());

        // Additions first: removals and commands may target an id staged this tick
        for (id, mut animation) in staged.additions {
            animation.start();
            tracing::debug!("Scheduled animation {:?} ({:?})", id, animation.name());
            self.animations.insert(id, animation);
        }

        for id in staged.removals {
            if let Some(animation) = self.animations.get_mut(&id) {
                animation.mark_for_removal();
            }
        }

        for command in staged.commands {
            let id = match command {
                Command::Pause(id)
                | Command::Resume(id)
                | Command::Stop(id, _)
                | Command::Restart(id) => id,
            };
            let Some(animation) = self.animations.get_mut(&id) else {
                continue;
            };
            match command {
                Command::Pause(_) => animation.pause(),
                Command::Resume(_) => animation.resume(),
                Command::Stop(_, goto_end) => animation.stop(goto_end),
                Command::Restart(_) => animation.restart(),
            }
        }

        let mut snapshots = self.shared.snapshots();
        snapshots.clear();
        snapshots.extend(
            self.animations
                .iter()
                .map(|(id, animation)| (*id, AnimationStatus::of(animation))),
        );
    }
}

// ============================================================================
// Animator
// ============================================================================

/// Owner of all top-level animations
pub struct Animator {
    shared: Arc<Shared>,
    ticker: Option<Ticker>,
    thread: Option<JoinHandle<Ticker>>,
    config: AnimatorConfig,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    pub fn new() -> Self {
        Self::with_config(AnimatorConfig::default())
    }

    pub fn with_config(config: AnimatorConfig) -> Self {
        let shared = Arc::new(Shared::new(config.fps));
        Self {
            ticker: Some(Ticker::new(Arc::clone(&shared))),
            shared,
            thread: None,
            config,
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Weak handle for other threads
    pub fn handle(&self) -> AnimatorHandle {
        AnimatorHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Schedule an animation; it starts at the next barrier
    pub fn add(&self, animation: Animation) -> AnimationId {
        self.shared.add(animation)
    }

    /// Request removal; honored on the next tick
    pub fn remove(&self, id: AnimationId) {
        self.shared.remove(id);
    }

    pub fn status(&self, id: AnimationId) -> Option<AnimationStatus> {
        self.shared.snapshots().get(&id).copied()
    }

    /// Number of animations as of the last barrier
    pub fn active_count(&self) -> usize {
        self.shared.snapshots().len()
    }

    /// Stop stepping animations; staged changes still apply
    pub fn pause(&self) {
        self.shared.running.store(false, Ordering::Release);
        tracing::debug!("Animator paused");
    }

    pub fn resume(&self) {
        self.shared.running.store(true, Ordering::Release);
        tracing::debug!("Animator resumed");
    }

    pub fn is_paused(&self) -> bool {
        !self.shared.running.load(Ordering::Acquire)
    }

    /// Change the background tick rate
    pub fn set_fps(&mut self, fps: u32) {
        self.config.fps = fps;
        self.shared.fps.store(fps, Ordering::Relaxed);
    }

    fn ticker_mut(&mut self) -> Result<&mut Ticker, AnimatorError> {
        self.ticker.as_mut().ok_or(AnimatorError::BackgroundRunning)
    }

    /// Tick from the wall clock
    pub fn tick(&mut self) -> Result<(), AnimatorError> {
        self.ticker_mut()?.tick();
        Ok(())
    }

    /// Tick with an explicit delta in milliseconds
    pub fn advance(&mut self, dt_ms: f32) -> Result<(), AnimatorError> {
        self.ticker_mut()?.advance(dt_ms);
        Ok(())
    }

    pub fn is_background_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Move the ticker onto a dedicated thread
    pub fn start_background(&mut self) -> Result<(), AnimatorError> {
        let Some(mut ticker) = self.ticker.take() else {
            return Err(AnimatorError::BackgroundRunning);
        };
        self.shared.stop.store(false, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(self.config.name.clone())
            .spawn(move || {
                let shared = Arc::clone(&ticker.shared);
                let mut next = Instant::now();
                while !shared.stop.load(Ordering::Acquire) {
                    ticker.tick();

                    let fps = shared.fps.load(Ordering::Relaxed);
                    if fps == 0 {
                        thread::yield_now();
                        continue;
                    }
                    let period = Duration::from_secs_f64(1.0 / fps as f64);
                    let now = Instant::now();
                    next = (next + period).max(now);
                    if next > now {
                        thread::sleep(next - now);
                    }
                }
                ticker
            });

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                tracing::debug!(
                    "Animator background thread started ({} fps)",
                    self.config.fps
                );
                Ok(())
            }
            Err(err) => {
                self.ticker = Some(Ticker::new(Arc::clone(&self.shared)));
                Err(AnimatorError::Spawn(err))
            }
        }
    }

    /// Stop the background thread and take the ticker back
    pub fn stop_background(&mut self) -> Result<(), AnimatorError> {
        let handle = self.thread.take().ok_or(AnimatorError::BackgroundNotRunning)?;
        self.shared.stop.store(true, Ordering::Release);

        let result = match handle.join() {
            Ok(mut ticker) => {
                // Foreground ticks measure from here, not from the last background tick
                ticker.last_tick = None;
                self.ticker = Some(ticker);
                Ok(())
            }
            Err(_) => {
                tracing::error!("Animator background thread panicked");
                self.ticker = Some(Ticker::new(Arc::clone(&self.shared)));
                Err(AnimatorError::ThreadPanicked)
            }
        };
        tracing::debug!("Animator background thread stopped");
        result
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.shared.stop.store(true, Ordering::Release);
            let _ = handle.join();
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cross-thread access to an [`Animator`]
///
/// Holds the shared staging area weakly; every call fails with
/// [`AnimatorError::Dropped`] once the animator is gone.
#[derive(Clone)]
pub struct AnimatorHandle {
    shared: Weak<Shared>,
}

impl AnimatorHandle {
    fn shared(&self) -> Result<Arc<Shared>, AnimatorError> {
        self.shared.upgrade().ok_or(AnimatorError::Dropped)
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Schedule an animation; it starts at the next barrier
    pub fn add(&self, animation: Animation) -> Result<AnimationId, AnimatorError> {
        Ok(self.shared()?.add(animation))
    }

    pub fn remove(&self, id: AnimationId) -> Result<(), AnimatorError> {
        self.shared()?.remove(id);
        Ok(())
    }

    pub fn pause(&self, id: AnimationId) -> Result<(), AnimatorError> {
        self.shared()?.command(Command::Pause(id));
        Ok(())
    }

    pub fn resume(&self, id: AnimationId) -> Result<(), AnimatorError> {
        self.shared()?.command(Command::Resume(id));
        Ok(())
    }

    pub fn stop(&self, id: AnimationId, goto_end: bool) -> Result<(), AnimatorError> {
        self.shared()?.command(Command::Stop(id, goto_end));
        Ok(())
    }

    pub fn restart(&self, id: AnimationId) -> Result<(), AnimatorError> {
        self.shared()?.command(Command::Restart(id));
        Ok(())
    }

    /// Pause the whole animator
    pub fn pause_all(&self) -> Result<(), AnimatorError> {
        self.shared()?.running.store(false, Ordering::Release);
        Ok(())
    }

    pub fn resume_all(&self) -> Result<(), AnimatorError> {
        self.shared()?.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Status as of the last barrier; `None` once the animation was reaped
    pub fn status(&self, id: AnimationId) -> Option<AnimationStatus> {
        self.shared.upgrade()?.snapshots().get(&id).copied()
    }
}

impl std::fmt::Debug for AnimatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatorHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

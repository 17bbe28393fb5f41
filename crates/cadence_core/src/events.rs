//! Animation lifecycle events
//!
//! Animations report their lifecycle to a single [`AnimationListener`].
//! Dispatch is filtered by a per-animation [`EventMask`], so a listener only
//! sees the kinds it subscribed to. Listeners run synchronously on the
//! thread that steps the animation; a blocking listener stalls that thread.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Kinds of lifecycle events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// First crossing of the initial delay
    Begin = 0,
    /// Start of every cycle, after its delay
    Start = 1,
    /// End of every cycle
    End = 2,
    /// Last cycle finished
    Complete = 3,
    Restart = 4,
    Pause = 5,
    Resume = 6,
    Stop = 7,
    /// A reportable update was written
    Step = 8,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Begin,
        EventKind::Start,
        EventKind::End,
        EventKind::Complete,
        EventKind::Restart,
        EventKind::Pause,
        EventKind::Resume,
        EventKind::Stop,
        EventKind::Step,
    ];

    /// Position of this kind in [`EventKind::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Bitset of subscribed event kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventMask {
    bits: u16,
}

impl EventMask {
    pub const NONE: EventMask = EventMask { bits: 0 };
    pub const ALL: EventMask = EventMask { bits: 0b1_1111_1111 };
    /// Every kind except the per-update STEP
    pub const LIFECYCLE: EventMask = EventMask {
        bits: Self::ALL.bits & !EventKind::Step.bit(),
    };

    /// Create from raw bits (unknown bits are dropped)
    pub const fn from_bits(bits: u16) -> Self {
        Self {
            bits: bits & Self::ALL.bits,
        }
    }

    pub const fn bits(&self) -> u16 {
        self.bits
    }

    pub const fn contains(&self, kind: EventKind) -> bool {
        self.bits & kind.bit() != 0
    }

    pub const fn with(self, kind: EventKind) -> Self {
        Self {
            bits: self.bits | kind.bit(),
        }
    }

    pub const fn without(self, kind: EventKind) -> Self {
        Self {
            bits: self.bits & !kind.bit(),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        Self { bits: kind.bit() }
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOr<EventKind> for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventKind) -> EventMask {
        self.with(rhs)
    }
}

impl BitAnd for EventMask {
    type Output = EventMask;

    fn bitand(self, rhs: EventMask) -> EventMask {
        EventMask {
            bits: self.bits & rhs.bits,
        }
    }
}

impl BitOr for EventKind {
    type Output = EventMask;

    fn bitor(self, rhs: EventKind) -> EventMask {
        EventMask::from(self).with(rhs)
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(EventKind::ALL.iter().filter(|k| self.contains(**k)))
            .finish()
    }
}

/// An event delivered to a listener
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationEvent<'a> {
    /// Name of the animation that fired the event, if it has one
    pub name: Option<&'a str>,
    pub kind: EventKind,
    pub completed_repeats: u32,
    /// Eased position at the time of the event
    pub position: f32,
}

/// Receiver of animation lifecycle events
pub trait AnimationListener: Send {
    fn on_event(&mut self, event: &AnimationEvent<'_>);
}

impl<F> AnimationListener for F
where
    F: FnMut(&AnimationEvent<'_>) + Send,
{
    fn on_event(&mut self, event: &AnimationEvent<'_>) {
        self(event)
    }
}

/// Event handler function type
pub type EventHandler = Box<dyn FnMut(&AnimationEvent<'_>) + Send>;

/// Typed per-kind callback registration
///
/// # Example
///
/// ```
/// use cadence_core::{Callbacks, EventKind, EventMask};
///
/// let callbacks = Callbacks::new()
///     .on(EventKind::Complete, |_| println!("done"))
///     .on(EventKind::Start, |e| println!("cycle {}", e.completed_repeats));
///
/// assert_eq!(callbacks.mask(), EventKind::Start | EventKind::Complete);
/// ```
#[derive(Default)]
pub struct Callbacks {
    handlers: [Option<EventHandler>; 9],
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for one event kind, replacing any previous one
    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: FnMut(&AnimationEvent<'_>) + Send + 'static,
    {
        self.handlers[kind.index()] = Some(Box::new(handler));
        self
    }

    pub fn on_begin<F>(self, handler: F) -> Self
    where
        F: FnMut(&AnimationEvent<'_>) + Send + 'static,
    {
        self.on(EventKind::Begin, handler)
    }

    pub fn on_start<F>(self, handler: F) -> Self
    where
        F: FnMut(&AnimationEvent<'_>) + Send + 'static,
    {
        self.on(EventKind::Start, handler)
    }

    pub fn on_end<F>(self, handler: F) -> Self
    where
        F: FnMut(&AnimationEvent<'_>) + Send + 'static,
    {
        self.on(EventKind::End, handler)
    }

    pub fn on_complete<F>(self, handler: F) -> Self
    where
        F: FnMut(&AnimationEvent<'_>) + Send + 'static,
    {
        self.on(EventKind::Complete, handler)
    }

    /// Mask of the kinds that have a handler
    pub fn mask(&self) -> EventMask {
        EventKind::ALL
            .iter()
            .filter(|kind| self.handlers[kind.index()].is_some())
            .fold(EventMask::NONE, |mask, kind| mask.with(*kind))
    }
}

impl AnimationListener for Callbacks {
    fn on_event(&mut self, event: &AnimationEvent<'_>) {
        if let Some(handler) = self.handlers[event.kind.index()].as_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("mask", &self.mask())
            .finish()
    }
}

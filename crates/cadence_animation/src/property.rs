//! Accessor-based property tween
//!
//! [`PropertyTween`] is the generic [`PropertyPlugin`]: it reads a start
//! value through an [`Accessor`] at begin time, resolves its [`Target`] and
//! writes `T::evaluate(position, begin, end)` on every update.
//!
//! Accessors come in two flavours:
//!
//! - [`ClosureAccessor`] wraps a getter and a setter closure
//! - [`TableAccessor`] looks a named field up in an [`AccessorTable`] built
//!   once per host type, and talks to a shared host behind `Arc<Mutex<_>>`
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use cadence_animation::{AccessorTable, PropertyTween, TableAccessor, Target};
//!
//! struct Sprite { x: f32, alpha: f32 }
//!
//! let table = Arc::new(
//!     AccessorTable::new()
//!         .with("x", |s: &Sprite| s.x, |s: &mut Sprite, v| s.x = v)
//!         .with("alpha", |s: &Sprite| s.alpha, |s: &mut Sprite, v| s.alpha = v),
//! );
//! let sprite = Arc::new(Mutex::new(Sprite { x: 0.0, alpha: 1.0 }));
//!
//! let fade = PropertyTween::new(
//!     TableAccessor::new(&sprite, table.clone(), "alpha"),
//!     Target::to(0.0_f32),
//! );
//! # let _ = fade;
//! ```

use crate::error::PluginError;
use crate::plugin::{PluginContext, PropertyPlugin};
use cadence_core::{Interpolate, RelativeOp};
use rustc_hash::FxHashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, Weak};

// ============================================================================
// Accessors
// ============================================================================

/// Read/write access to one property of some host object
pub trait Accessor<T>: Send {
    /// Bind to the property; called once per animation start
    fn resolve(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Current value, `None` if the host is gone
    fn get(&self) -> Option<T>;

    fn set(&mut self, value: T);
}

/// Accessor over a pair of closures
pub struct ClosureAccessor<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> ClosureAccessor<G, S> {
    pub fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<T, G, S> Accessor<T> for ClosureAccessor<G, S>
where
    G: Fn() -> Option<T> + Send,
    S: FnMut(T) + Send,
{
    fn get(&self) -> Option<T> {
        (self.getter)()
    }

    fn set(&mut self, value: T) {
        (self.setter)(value)
    }
}

/// Field getter of a host type
pub type Getter<H, T> = fn(&H) -> T;
/// Field setter of a host type
pub type Setter<H, T> = fn(&mut H, T);

/// Named field accessors of one host type
///
/// Built once and shared between every tween that animates the same type.
pub struct AccessorTable<H, T> {
    entries: FxHashMap<String, (Getter<H, T>, Setter<H, T>)>,
}

impl<H, T> Default for AccessorTable<H, T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<H, T> AccessorTable<H, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field (builder form)
    pub fn with(mut self, name: impl Into<String>, get: Getter<H, T>, set: Setter<H, T>) -> Self {
        self.insert(name, get, set);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, get: Getter<H, T>, set: Setter<H, T>) {
        self.entries.insert(name.into(), (get, set));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<(Getter<H, T>, Setter<H, T>)> {
        self.entries.get(name).copied()
    }
}

/// Accessor for a named field of a shared host
///
/// Holds the host weakly: once every strong reference is dropped the tween
/// stops writing and the next `resolve` fails with
/// [`PluginError::TargetUnavailable`].
pub struct TableAccessor<H, T> {
    host: Weak<Mutex<H>>,
    table: Arc<AccessorTable<H, T>>,
    field: String,
    bound: Option<(Getter<H, T>, Setter<H, T>)>,
}

impl<H, T> TableAccessor<H, T> {
    pub fn new(host: &Arc<Mutex<H>>, table: Arc<AccessorTable<H, T>>, field: impl Into<String>) -> Self {
        Self {
            host: Arc::downgrade(host),
            table,
            field: field.into(),
            bound: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl<H, T> Accessor<T> for TableAccessor<H, T>
where
    H: Send,
    T: 'static,
{
    fn resolve(&mut self) -> Result<(), PluginError> {
        if self.host.strong_count() == 0 {
            return Err(PluginError::TargetUnavailable(self.field.clone()));
        }
        let accessors = self
            .table
            .lookup(&self.field)
            .ok_or_else(|| PluginError::PropertyNotFound(self.field.clone()))?;
        self.bound = Some(accessors);
        Ok(())
    }

    fn get(&self) -> Option<T> {
        let (get, _) = self.bound?;
        let host = self.host.upgrade()?;
        let guard = host.lock().unwrap_or_else(PoisonError::into_inner);
        Some(get(&guard))
    }

    fn set(&mut self, value: T) {
        let Some((_, set)) = self.bound else {
            return;
        };
        if let Some(host) = self.host.upgrade() {
            let mut guard = host.lock().unwrap_or_else(PoisonError::into_inner);
            set(&mut guard, value);
        }
    }
}

// ============================================================================
// Targets
// ============================================================================

/// End value of a property tween
#[derive(Clone, Debug, PartialEq)]
pub enum Target<T> {
    Absolute(T),
    /// Resolved against the value captured at begin time
    Relative(RelativeOp, T),
}

impl<T> Target<T> {
    pub fn to(value: T) -> Self {
        Target::Absolute(value)
    }

    pub fn by(op: RelativeOp, operand: T) -> Self {
        Target::Relative(op, operand)
    }
}

impl<T: Interpolate> Target<T> {
    fn resolve(&self, begin: &T) -> T {
        match self {
            Target::Absolute(value) => value.clone(),
            Target::Relative(op, operand) => begin.apply_op(*op, operand),
        }
    }
}

impl<T> From<T> for Target<T> {
    fn from(value: T) -> Self {
        Target::Absolute(value)
    }
}

// ============================================================================
// Property Tween
// ============================================================================

/// Tweens one property from its captured (or explicit) start value to a target
pub struct PropertyTween<T, A> {
    accessor: A,
    target: Target<T>,
    from: Option<T>,
    range: Option<(T, T)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, A> PropertyTween<T, A>
where
    T: Interpolate,
    A: Accessor<T>,
{
    pub fn new(accessor: A, target: impl Into<Target<T>>) -> Self {
        Self {
            accessor,
            target: target.into(),
            from: None,
            range: None,
            _marker: PhantomData,
        }
    }

    /// Start from an explicit value instead of the one read at begin time
    pub fn starting_at(mut self, value: T) -> Self {
        self.from = Some(value);
        self
    }

    /// Resolved `(begin, end)` pair, once captured
    pub fn range(&self) -> Option<&(T, T)> {
        self.range.as_ref()
    }

    fn capture(&mut self) {
        let begin = self.from.clone().or_else(|| self.accessor.get());
        self.range = begin.map(|begin| {
            let end = self.target.resolve(&begin);
            (begin, end)
        });
    }
}

impl<T, A> PropertyPlugin for PropertyTween<T, A>
where
    T: Interpolate,
    A: Accessor<T>,
{
    fn initialize(&mut self, _ctx: &PluginContext<'_>) -> Result<(), PluginError> {
        self.range = None;
        self.accessor.resolve()
    }

    fn begin(&mut self, _ctx: &PluginContext<'_>) {
        self.capture();
    }

    fn update(&mut self, ctx: &PluginContext<'_>) {
        // Seeking can update before the delay was ever crossed
        if self.range.is_none() {
            self.capture();
        }
        if let Some((begin, end)) = &self.range {
            let value = T::evaluate(ctx.position, begin, end);
            self.accessor.set(value);
        }
    }

    fn end(&mut self, _ctx: &PluginContext<'_>) {
        self.range = None;
    }
}

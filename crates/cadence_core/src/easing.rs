//! Easing functions for animations
//!
//! An [`Easing`] is a curve formula paired with a direction modifier. Every
//! curve is written once in its "in" form; the `Out` and `InOut` variants are
//! derived from it, so all curves share the same direction semantics.

use std::f32::consts::PI;

/// Direction modifier applied on top of a [`Curve`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EaseDirection {
    /// Slow start
    #[default]
    In,
    /// Slow end
    Out,
    /// Slow start and slow end
    InOut,
}

/// Curve formula, expressed in its "ease in" form
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Curve {
    #[default]
    Linear,
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    /// Overshoots slightly before settling
    Back,
    Elastic,
    Bounce,
    /// CSS-style cubic bezier with control points (x1, y1, x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// Caller-supplied curve
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(fn(f32) -> f32),
}

impl Curve {
    /// Evaluate the "ease in" form of this curve
    fn ease_in(&self, t: f32) -> f32 {
        match self {
            Curve::Linear => t,
            Curve::Quad => t * t,
            Curve::Cubic => t * t * t,
            Curve::Quart => t * t * t * t,
            Curve::Quint => t * t * t * t * t,
            Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
            Curve::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Curve::Back => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            Curve::Elastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    -(2.0_f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            Curve::Bounce => 1.0 - bounce_out(1.0 - t),
            Curve::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
            Curve::Custom(f) => f(t),
        }
    }
}

/// An easing function: a curve plus a direction
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Easing {
    pub curve: Curve,
    pub direction: EaseDirection,
}

impl Easing {
    pub const LINEAR: Easing = Easing::new(Curve::Linear, EaseDirection::In);
    pub const EASE_IN: Easing = Easing::new(Curve::Cubic, EaseDirection::In);
    pub const EASE_OUT: Easing = Easing::new(Curve::Cubic, EaseDirection::Out);
    pub const EASE_IN_OUT: Easing = Easing::new(Curve::Cubic, EaseDirection::InOut);

    pub const fn new(curve: Curve, direction: EaseDirection) -> Self {
        Self { curve, direction }
    }

    /// Curve in its "ease in" direction
    pub const fn ease_in(curve: Curve) -> Self {
        Self::new(curve, EaseDirection::In)
    }

    /// Curve in its "ease out" direction
    pub const fn ease_out(curve: Curve) -> Self {
        Self::new(curve, EaseDirection::Out)
    }

    /// Curve in its "ease in-out" direction
    pub const fn ease_in_out(curve: Curve) -> Self {
        Self::new(curve, EaseDirection::InOut)
    }

    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    pub const fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::ease_in(Curve::CubicBezier(x1, y1, x2, y2))
    }

    /// Wrap a plain function as an easing curve
    pub const fn custom(f: fn(f32) -> f32) -> Self {
        Self::ease_in(Curve::Custom(f))
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    ///
    /// The result may leave `[0, 1]` for overshooting curves such as
    /// [`Curve::Back`] and [`Curve::Elastic`].
    pub fn apply(&self, t: f32) -> f32 {
        match self.direction {
            EaseDirection::In => self.curve.ease_in(t),
            EaseDirection::Out => 1.0 - self.curve.ease_in(1.0 - t),
            EaseDirection::InOut => {
                if t < 0.5 {
                    self.curve.ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - self.curve.ease_in(2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Cubic bezier easing calculation (same curve as CSS `cubic-bezier()`).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter at high frame rates.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let x1 = x1 as f64;
    let y1 = y1 as f64;
    let x2 = x2 as f64;
    let y2 = y2 as f64;

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break; // slope too flat, switch to binary search
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

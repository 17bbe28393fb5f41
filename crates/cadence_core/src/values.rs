//! Animatable value types
//!
//! [`Interpolate`] is the value-evaluator capability consumed by property
//! plugins: it evaluates a position between a begin and an end value, and it
//! resolves relative targets (`"+="`, `"-="`, ...) against a captured begin
//! value.

use std::fmt;
use std::str::FromStr;

/// Relative target operation, applied to the value captured at begin time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelativeOp {
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

impl RelativeOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelativeOp::Add => "+=",
            RelativeOp::Sub => "-=",
            RelativeOp::Mul => "*=",
            RelativeOp::Div => "/=",
        }
    }

    /// Apply the operation to two scalars
    pub fn apply_f32(&self, begin: f32, operand: f32) -> f32 {
        match self {
            RelativeOp::Add => begin + operand,
            RelativeOp::Sub => begin - operand,
            RelativeOp::Mul => begin * operand,
            RelativeOp::Div => begin / operand,
        }
    }

    pub fn apply_f64(&self, begin: f64, operand: f64) -> f64 {
        match self {
            RelativeOp::Add => begin + operand,
            RelativeOp::Sub => begin - operand,
            RelativeOp::Mul => begin * operand,
            RelativeOp::Div => begin / operand,
        }
    }
}

impl fmt::Display for RelativeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unrecognized relative operation string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRelativeOpError(pub String);

impl fmt::Display for ParseRelativeOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relative operation: {:?}", self.0)
    }
}

impl std::error::Error for ParseRelativeOpError {}

impl FromStr for RelativeOp {
    type Err = ParseRelativeOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+=" => Ok(RelativeOp::Add),
            "-=" => Ok(RelativeOp::Sub),
            "*=" => Ok(RelativeOp::Mul),
            "/=" => Ok(RelativeOp::Div),
            other => Err(ParseRelativeOpError(other.to_string())),
        }
    }
}

/// Trait for values that can be interpolated by a tween
pub trait Interpolate: Clone + Send + 'static {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    ///
    /// `t` may leave `[0, 1]` for overshooting easing curves.
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Resolve a relative target against a begin value
    fn apply_op(&self, op: RelativeOp, operand: &Self) -> Self;

    /// Value written for a given position between `begin` and `end`
    fn evaluate(position: f32, begin: &Self, end: &Self) -> Self {
        begin.lerp(end, position)
    }
}

// ============================================================================
// Scalar Implementations
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn apply_op(&self, op: RelativeOp, operand: &Self) -> Self {
        op.apply_f32(*self, *operand)
    }
}

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t as f64
    }

    fn apply_op(&self, op: RelativeOp, operand: &Self) -> Self {
        op.apply_f64(*self, *operand)
    }
}

impl Interpolate for i32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let value = *self as f64 + (*other as f64 - *self as f64) * t as f64;
        value.round() as i32
    }

    fn apply_op(&self, op: RelativeOp, operand: &Self) -> Self {
        match op {
            RelativeOp::Add => self.saturating_add(*operand),
            RelativeOp::Sub => self.saturating_sub(*operand),
            RelativeOp::Mul => self.saturating_mul(*operand),
            RelativeOp::Div => self.checked_div(*operand).unwrap_or(*self),
        }
    }
}

// ============================================================================
// Vector Implementations
// ============================================================================

impl<const N: usize> Interpolate for [f32; N] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = *self;
        for (i, value) in out.iter_mut().enumerate() {
            *value = self[i] + (other[i] - self[i]) * t;
        }
        out
    }

    fn apply_op(&self, op: RelativeOp, operand: &Self) -> Self {
        let mut out = *self;
        for (i, value) in out.iter_mut().enumerate() {
            *value = op.apply_f32(self[i], operand[i]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
        assert!((f64::evaluate(0.5, &2.0, &4.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_int_interpolation_rounds() {
        assert_eq!(0_i32.lerp(&10, 0.24), 2);
        assert_eq!(0_i32.lerp(&10, 0.26), 3);
        assert_eq!(10_i32.apply_op(RelativeOp::Div, &0), 10);
    }

    #[test]
    fn test_array_interpolation() {
        let a = [0.0_f32, 0.0, 0.0];
        let b = [10.0, 20.0, 30.0];
        let mid = a.lerp(&b, 0.5);

        assert!((mid[0] - 5.0).abs() < 1e-6);
        assert!((mid[1] - 10.0).abs() < 1e-6);
        assert!((mid[2] - 15.0).abs() < 1e-6);

        let moved = [1.0_f32, 2.0].apply_op(RelativeOp::Add, &[1.0, 1.0]);
        assert_eq!(moved, [2.0, 3.0]);
    }

    #[test]
    fn test_relative_op_parse() {
        assert_eq!("+=".parse::<RelativeOp>(), Ok(RelativeOp::Add));
        assert_eq!(" *= ".parse::<RelativeOp>(), Ok(RelativeOp::Mul));
        assert!("%=".parse::<RelativeOp>().is_err());
        assert_eq!(RelativeOp::Sub.to_string(), "-=");
        assert_eq!(5.0_f32.apply_op(RelativeOp::Sub, &2.0), 3.0);
    }
}

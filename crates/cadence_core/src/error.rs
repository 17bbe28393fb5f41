//! Configuration error types

use thiserror::Error;

/// Rejected timing configuration
///
/// Raised by the validated setters on [`TimingConfig`](crate::TimingConfig)
/// and by builders at construction time. Values are never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Duration was negative or NaN
    #[error("Invalid duration: {0} (must be >= 0 or infinite)")]
    InvalidDuration(f32),

    /// Delay was negative, NaN or infinite
    #[error("Invalid delay: {0} (must be a finite value >= 0)")]
    InvalidDelay(f32),

    /// Repeat delay was negative, NaN or infinite
    #[error("Invalid repeat delay: {0} (must be a finite value >= 0)")]
    InvalidRepeatDelay(f32),

    /// Time scale was zero, negative, NaN or infinite
    #[error("Invalid time scale: {0} (must be a finite value > 0)")]
    InvalidTimeScale(f32),

    /// Repeat count of zero
    #[error("Invalid repeat count: an animation plays at least once")]
    InvalidRepeat,

    /// Infinite repeat over a cycle that takes no time would never yield
    #[error("Infinite repeat requires a non-zero duration or repeat delay")]
    ZeroLengthInfiniteLoop,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

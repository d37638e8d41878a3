use std::error::Error;
use std::fmt;

/// An error type indicating a [`TrainerConfig`] holds
/// values training can't run with.
///
/// [`TrainerConfig`]: crate::TrainerConfig
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A probability outside of [0.0, 1.0], or `NaN`.
    InvalidProbability { field: &'static str, value: f64 },
    /// A negative, infinite or `NaN` distance modifier or threshold.
    InvalidModifier { field: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProbability { field, value } => write!(
                f,
                "{} must be a probability in [0, 1], got {}",
                field, value
            ),
            Self::InvalidModifier { field, value } => write!(
                f,
                "{} must be finite and non-negative, got {}",
                field, value
            ),
        }
    }
}

impl Error for ConfigError {}

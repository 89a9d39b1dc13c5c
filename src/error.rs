//! Construction-time configuration errors
//!
//! The simulation itself never fails once built; everything that can go wrong
//! is caught when a grid, wind field, or beam controller is created.

use thiserror::Error;

/// Errors raised when validating tuning parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid dimensions must be positive (got {cols}x{rows})")]
    InvalidDimensions { cols: i64, rows: i64 },
    #[error("tile size must be a positive finite number (got {0})")]
    InvalidTileSize(f32),
    #[error("{field} must be a non-negative finite rate (got {value})")]
    InvalidRate { field: &'static str, value: f32 },
    #[error("{field} must be a probability in [0, 1] (got {value})")]
    InvalidProbability { field: &'static str, value: f32 },
    #[error("beam breakpoints must satisfy 0 <= no_beam < bubble < cone <= 1 (got {no_beam}, {bubble}, {cone})")]
    InvalidBreakpoints { no_beam: f32, bubble: f32, cone: f32 },
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("failed to parse settings: {0}")]
    Parse(String),
    #[error("failed to read settings file {path}: {message}")]
    Io { path: String, message: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Reject negative or non-finite rates.
pub(crate) fn check_rate(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { field, value })
    }
}

/// Reject rates that must be strictly positive (divisors, tick rates).
pub(crate) fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { field, value })
    }
}

pub(crate) fn check_probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

pub(crate) fn check_ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { field, min, max })
    }
}

//! Validation Error Types

use thiserror::Error;

/// Errors during sample validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite reading
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    /// Session-scoped event counter went backwards
    #[error("{field} regressed from {previous} to {current}")]
    CounterRegressed {
        field: &'static str,
        previous: u32,
        current: u32,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::NonFinite { field }
            | ValidationError::CounterRegressed { field, .. } => field,
        }
    }
}

//! Alerting System
//!
//! Alert lifecycle management for a monitoring session:
//! - Raise, refresh, escalate and clear alerts from fatigue transitions,
//!   condition flags and correlation results
//! - De-duplication (at most one open alert per kind)
//! - Operator actions: acknowledge, clear, declare emergency
//! - Fan-out of lifecycle events to subscribers

mod alert;
mod bus;
mod engine;

pub use alert::{Alert, AlertChange, AlertEvent, AlertId, AlertKind, Severity};
pub use bus::AlertBus;
pub use engine::{AlertConfig, AlertEngine, ReadingOutcome};

use thiserror::Error;

/// Alerting errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlertError {
    #[error("No open alert with id {0}")]
    UnknownAlert(AlertId),
}

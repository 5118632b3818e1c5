//! Driver Monitoring Sessions
//!
//! One [`MonitoringSession`] per checked-in driver. Each session pairs the
//! driver and vehicle streams into readings, flags them, tracks fatigue,
//! correlates the window and keeps the alert set current.
//! [`SessionManager`] owns the active sessions of the process.

mod config;
mod dispatch;
mod manager;
mod session;
mod summary;

pub use config::MonitorConfig;
pub use dispatch::{
    ChannelDispatcher, DispatchError, DispatchRequest, EmergencyDispatcher, LoggingDispatcher,
};
pub use manager::{SessionHandle, SessionManager};
pub use session::{EmergencyOutcome, MonitoringSession, SessionCounters, SessionDiagnostics};
pub use summary::{
    InMemorySummaryLog, SessionSummary, SummaryError, SummarySink, TracingSummarySink,
};

use alerting::{AlertError, AlertId};
use data_validator::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid sample: {0}")]
    InvalidSample(#[from] ValidationError),

    #[error("No open alert with id {0}")]
    UnknownAlert(AlertId),

    #[error("Session {0} is checked out")]
    SessionClosed(Uuid),

    #[error("No active session with id {0}")]
    UnknownSession(Uuid),

    #[error("Driver {0} is already checked in")]
    AlreadyCheckedIn(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<AlertError> for SessionError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::UnknownAlert(id) => SessionError::UnknownAlert(id),
        }
    }
}

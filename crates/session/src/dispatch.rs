//! Emergency dispatch collaborator

use alerting::Alert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telemetry::{DriverSample, VehicleSample};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

/// Dispatch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatch channel closed")]
    ChannelClosed,

    #[error("Dispatch channel full")]
    ChannelFull,

    #[error("Dispatch rejected: {0}")]
    Rejected(String),
}

/// Everything handed to the dispatch service when an emergency is declared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub session_id: Uuid,
    pub driver_id: String,
    pub vehicle_id: String,
    pub reason: String,
    pub location: Option<String>,
    pub latest_driver: Option<DriverSample>,
    pub latest_vehicle: Option<VehicleSample>,
    pub alert: Alert,
    pub requested_at: DateTime<Utc>,
}

/// Outbound emergency capability.
///
/// Implementations must not block: hand the request off and return.
pub trait EmergencyDispatcher: Send + Sync {
    fn dispatch(&self, request: DispatchRequest) -> Result<(), DispatchError>;
}

/// Forwards requests over a channel to an async dispatch task
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<DispatchRequest>,
}

impl ChannelDispatcher {
    pub fn new(sender: mpsc::Sender<DispatchRequest>) -> Self {
        Self { sender }
    }

    /// Create a dispatcher together with the receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DispatchRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl EmergencyDispatcher for ChannelDispatcher {
    fn dispatch(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        self.sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                error!("emergency dispatch channel full");
                DispatchError::ChannelFull
            }
            mpsc::error::TrySendError::Closed(_) => {
                error!("emergency dispatch channel closed");
                DispatchError::ChannelClosed
            }
        })
    }
}

/// Dispatcher that only records the request in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

impl EmergencyDispatcher for LoggingDispatcher {
    fn dispatch(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        warn!(
            session_id = %request.session_id,
            driver_id = %request.driver_id,
            vehicle_id = %request.vehicle_id,
            location = request.location.as_deref().unwrap_or("unknown"),
            reason = %request.reason,
            "EMERGENCY dispatch requested"
        );
        Ok(())
    }
}

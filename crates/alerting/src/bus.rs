//! Alert event bus

use crate::alert::AlertEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of alert lifecycle events.
///
/// Every subscriber independently receives each published [`AlertEvent`].
/// Slow subscribers that fall more than the channel capacity behind observe
/// `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct AlertBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl AlertBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers reached; zero when nobody listens.
    pub fn publish(&self, event: AlertEvent) -> usize {
        trace!(
            alert_id = %event.alert.id,
            change = event.change.as_str(),
            "publishing alert event"
        );
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! Session registry: check-in, check-out and lookup

use crate::config::MonitorConfig;
use crate::dispatch::{EmergencyDispatcher, LoggingDispatcher};
use crate::session::MonitoringSession;
use crate::summary::{SessionSummary, SummarySink, TracingSummarySink};
use crate::SessionError;
use alerting::{AlertBus, AlertEvent};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::Sample;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<MonitoringSession>>;

/// Active sessions plus the driver index used to refuse a second check-in
#[derive(Default)]
struct Registry {
    sessions: HashMap<Uuid, (String, SessionHandle)>,
    by_driver: HashMap<String, Uuid>,
}

impl Registry {
    fn insert(&mut self, id: Uuid, driver_id: &str, handle: SessionHandle) {
        self.by_driver.insert(driver_id.to_string(), id);
        self.sessions.insert(id, (driver_id.to_string(), handle));
    }

    fn remove(&mut self, id: Uuid) -> Option<SessionHandle> {
        let (driver_id, handle) = self.sessions.remove(&id)?;
        self.by_driver.remove(&driver_id);
        Some(handle)
    }
}

/// Owns every active session of the process.
///
/// Sessions are independent; each one is locked separately so ingestion
/// for one driver never waits on another. Registry operations never take a
/// session lock.
pub struct SessionManager {
    config: MonitorConfig,
    registry: RwLock<Registry>,
    bus: AlertBus,
    dispatcher: Arc<dyn EmergencyDispatcher>,
    summaries: Arc<dyn SummarySink>,
}

impl SessionManager {
    pub fn new(
        config: MonitorConfig,
        dispatcher: Arc<dyn EmergencyDispatcher>,
        summaries: Arc<dyn SummarySink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let bus = AlertBus::new(config.event_bus_capacity);
        Ok(Self {
            config,
            registry: RwLock::new(Registry::default()),
            bus,
            dispatcher,
            summaries,
        })
    }

    /// Manager that only logs dispatch requests and summaries
    pub fn with_defaults(config: MonitorConfig) -> Result<Self, SessionError> {
        Self::new(config, Arc::new(LoggingDispatcher), Arc::new(TracingSummarySink))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Subscribe to alert events of every session
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.bus.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Start a session. A driver may only hold one active session.
    pub async fn check_in(
        &self,
        driver_id: &str,
        vehicle_id: &str,
    ) -> Result<Uuid, SessionError> {
        let mut registry = self.registry.write().await;
        if registry.by_driver.contains_key(driver_id) {
            return Err(SessionError::AlreadyCheckedIn(driver_id.to_string()));
        }

        let session = MonitoringSession::new(
            driver_id,
            vehicle_id,
            self.config.clone(),
            self.bus.clone(),
            Arc::clone(&self.dispatcher),
        )?;
        let id = session.id();
        registry.insert(id, driver_id, Arc::new(Mutex::new(session)));
        metrics::gauge!("monitor_active_sessions").set(registry.sessions.len() as f64);
        Ok(id)
    }

    /// Look up an active session
    pub async fn session(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        self.registry
            .read()
            .await
            .sessions
            .get(&id)
            .map(|(_, handle)| Arc::clone(handle))
            .ok_or(SessionError::UnknownSession(id))
    }

    /// Ingest a sample into a session
    pub async fn ingest(&self, id: Uuid, sample: Sample) -> Result<(), SessionError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        session.ingest(sample)
    }

    /// End a session and hand its summary to the reporting sink.
    ///
    /// A failing sink is logged; the session is closed regardless.
    pub async fn check_out(&self, id: Uuid) -> Result<SessionSummary, SessionError> {
        let handle = {
            let mut registry = self.registry.write().await;
            let handle = registry.remove(id).ok_or(SessionError::UnknownSession(id))?;
            metrics::gauge!("monitor_active_sessions").set(registry.sessions.len() as f64);
            handle
        };

        let summary = handle.lock().await.close()?;
        if let Err(err) = self.summaries.record(&summary) {
            warn!(session_id = %id, error = %err, "failed to record session summary");
        }
        Ok(summary)
    }

    /// Ids of the active sessions
    pub async fn active_sessions(&self) -> Vec<Uuid> {
        self.registry.read().await.sessions.keys().copied().collect()
    }

    pub async fn active_count(&self) -> usize {
        self.registry.read().await.sessions.len()
    }

    /// Check out every active session
    pub async fn shutdown(&self) -> Vec<SessionSummary> {
        let ids = self.active_sessions().await;
        info!(sessions = ids.len(), "checking out all sessions");
        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.check_out(id).await {
                Ok(summary) => summaries.push(summary),
                Err(err) => warn!(session_id = %id, error = %err, "check-out failed"),
            }
        }
        summaries
    }
}

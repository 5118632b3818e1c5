//! Session summaries and the reporting collaborator

use alerting::Alert;
use chrono::{DateTime, Utc};
use fatigue::FatigueLevel;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Summary handed to the reporting collaborator at check-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub driver_id: String,
    pub vehicle_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub driver_samples: u64,
    pub vehicle_samples: u64,
    pub rejected_samples: u64,
    pub readings: u64,
    pub paired_readings: u64,
    pub harsh_brake_events: u32,
    pub rapid_accel_events: u32,
    pub final_fatigue: FatigueLevel,
    /// Every alert of the session, cleared ones first
    pub alerts: Vec<Alert>,
}

/// Summary sink errors
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Summary log lock error: {0}")]
    Lock(String),
    #[error("Summary rejected: {0}")]
    Rejected(String),
}

/// Receives the summary of each checked-out session
pub trait SummarySink: Send + Sync {
    fn record(&self, summary: &SessionSummary) -> Result<(), SummaryError>;
}

/// Bounded in-memory summary log
pub struct InMemorySummaryLog {
    records: Mutex<VecDeque<SessionSummary>>,
    max_records: usize,
}

impl InMemorySummaryLog {
    pub fn new(max_records: usize) -> Self {
        info!(max_records, "creating in-memory summary log");
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records: max_records.max(1),
        }
    }

    /// Most recent summaries first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionSummary>, SummaryError> {
        let records = self
            .records
            .lock()
            .map_err(|e| SummaryError::Lock(e.to_string()))?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySummaryLog {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl SummarySink for InMemorySummaryLog {
    fn record(&self, summary: &SessionSummary) -> Result<(), SummaryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| SummaryError::Lock(e.to_string()))?;

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }

        records.push_back(summary.clone());
        debug!(session_id = %summary.session_id, "session summary stored");
        Ok(())
    }
}

/// Sink that writes summaries to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSummarySink;

impl SummarySink for TracingSummarySink {
    fn record(&self, summary: &SessionSummary) -> Result<(), SummaryError> {
        info!(
            session_id = %summary.session_id,
            driver_id = %summary.driver_id,
            vehicle_id = %summary.vehicle_id,
            readings = summary.readings,
            alerts = summary.alerts.len(),
            harsh_brake_events = summary.harsh_brake_events,
            "session summary"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(driver: &str) -> SessionSummary {
        SessionSummary {
            session_id: Uuid::new_v4(),
            driver_id: driver.to_string(),
            vehicle_id: "TRK-A001".to_string(),
            checked_in_at: Utc::now(),
            checked_out_at: Some(Utc::now()),
            driver_samples: 0,
            vehicle_samples: 0,
            rejected_samples: 0,
            readings: 0,
            paired_readings: 0,
            harsh_brake_events: 0,
            rapid_accel_events: 0,
            final_fatigue: FatigueLevel::Normal,
            alerts: Vec::new(),
        }
    }

    #[test]
    fn test_retention() {
        let log = InMemorySummaryLog::new(2);
        for driver in ["DR-001", "DR-002", "DR-003"] {
            log.record(&summary(driver)).unwrap();
        }
        assert_eq!(log.len(), 2);
        let recent = log.recent(10).unwrap();
        assert_eq!(recent[0].driver_id, "DR-003");
        assert_eq!(recent[1].driver_id, "DR-002");
    }
}

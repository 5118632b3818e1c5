//! Alert Engine Implementation

use crate::alert::{Alert, AlertChange, AlertEvent, AlertId, AlertKind, Severity};
use crate::AlertError;
use correlation::CorrelationResult;
use fatigue::{FatigueState, FatigueTransition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use telemetry::{ConditionFlag, Reading};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Alert engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Consecutive readings carrying a flag before its alert is raised
    pub debounce_threshold: u32,
    /// Consecutive readings without the flag before its alert is cleared
    pub cooldown_threshold: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            debounce_threshold: 2,
            cooldown_threshold: 3,
        }
    }
}

/// Everything the engine needs to know about one processed reading
#[derive(Debug, Clone, Copy)]
pub struct ReadingOutcome<'a> {
    pub reading: &'a Reading,
    /// Fatigue state after the reading was classified
    pub fatigue: &'a FatigueState,
    /// Transition caused by this reading, if any
    pub transition: Option<FatigueTransition>,
    pub correlations: &'a [CorrelationResult],
}

/// Run lengths for a flag-driven alert kind
#[derive(Debug, Clone, Copy, Default)]
struct FlagRun {
    present: u32,
    absent: u32,
}

/// Alert lifecycle engine, one per monitoring session.
///
/// Keeps at most one open alert per kind; cleared alerts move to history.
pub struct AlertEngine {
    session_id: Uuid,
    config: AlertConfig,
    /// Open alerts by kind
    open: BTreeMap<AlertKind, Alert>,
    /// Cleared alerts, oldest first
    history: Vec<Alert>,
    /// Flag run lengths by kind
    runs: HashMap<AlertKind, FlagRun>,
}

impl AlertEngine {
    /// Create a new alert engine
    pub fn new(session_id: Uuid, config: AlertConfig) -> Self {
        debug!(%session_id, ?config, "creating alert engine");
        Self {
            session_id,
            config,
            open: BTreeMap::new(),
            history: Vec::new(),
            runs: HashMap::new(),
        }
    }

    /// Apply the alert rules to one processed reading
    pub fn process(&mut self, outcome: ReadingOutcome<'_>) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        let reading = outcome.reading;
        let at_ms = reading.timestamp_ms;

        match outcome.transition {
            Some(FatigueTransition::EnteredWarning { .. }) => {
                events.extend(self.raise_or_refresh(
                    AlertKind::Fatigue,
                    fatigue_message(),
                    at_ms,
                ));
            }
            Some(FatigueTransition::ReturnedToNormal { .. }) => {
                events.extend(self.clear_kind(AlertKind::Fatigue, at_ms));
            }
            None if outcome.fatigue.is_warning() => {
                if !self.open.contains_key(&AlertKind::Fatigue) {
                    // Cleared by an operator while still fatigued: raise again
                    // while the warning run holds
                    if outcome.fatigue.consecutive_warning_samples
                        >= self.config.debounce_threshold
                    {
                        events.extend(self.raise_or_refresh(
                            AlertKind::Fatigue,
                            fatigue_message(),
                            at_ms,
                        ));
                    }
                } else if reading.flags.contains(ConditionFlag::SteeringIrregular) {
                    events.extend(self.corroborate_fatigue(at_ms));
                }
            }
            None => {}
        }

        for result in outcome.correlations.iter().filter(|r| r.elevated_risk) {
            events.extend(self.annotate_fatigue(&result.pair, at_ms));
        }

        for kind in AlertKind::FLAG_DRIVEN {
            if !reading_covers(reading, kind) {
                continue;
            }
            let present = kind
                .trigger_flags()
                .iter()
                .any(|flag| reading.flags.contains(*flag));
            events.extend(self.track_flag_kind(kind, present, reading));
        }

        events
    }

    fn track_flag_kind(
        &mut self,
        kind: AlertKind,
        present: bool,
        reading: &Reading,
    ) -> Option<AlertEvent> {
        let run = self.runs.entry(kind).or_default();
        if present {
            run.present += 1;
            run.absent = 0;
        } else {
            run.absent += 1;
            run.present = 0;
        }
        let run = *run;

        if present && run.present >= self.config.debounce_threshold {
            self.raise_or_refresh(kind, flag_message(kind, reading), reading.timestamp_ms)
        } else if !present && run.absent >= self.config.cooldown_threshold {
            self.clear_kind(kind, reading.timestamp_ms)
        } else {
            None
        }
    }

    /// Raise a sensor alert, or refresh the open one of the same kind
    fn raise_or_refresh(&mut self, kind: AlertKind, message: String, at_ms: u64) -> Option<AlertEvent> {
        let severity = kind.sensor_severity();
        if let Some(alert) = self.open.get_mut(&kind) {
            alert.updated_at_ms = at_ms;
            if severity > alert.severity {
                alert.severity = severity;
                alert.message = message;
                let alert = alert.clone();
                return Some(self.event(AlertChange::Escalated, alert));
            }
            debug!(kind = kind.as_str(), at_ms, "open alert refreshed");
            return None;
        }

        let alert = Alert::new(kind, severity, message, at_ms, at_ms);
        Some(self.insert_raised(alert))
    }

    fn insert_raised(&mut self, alert: Alert) -> AlertEvent {
        info!(
            session_id = %self.session_id,
            alert_id = %alert.id,
            kind = alert.kind.as_str(),
            severity = alert.severity.as_str(),
            "alert raised"
        );
        metrics::counter!("monitor_alerts_raised_total", "kind" => alert.kind.as_str())
            .increment(1);
        self.open.insert(alert.kind, alert.clone());
        self.event(AlertChange::Raised, alert)
    }

    fn clear_kind(&mut self, kind: AlertKind, at_ms: u64) -> Option<AlertEvent> {
        let mut alert = self.open.remove(&kind)?;
        alert.cleared_at_ms = Some(at_ms);
        info!(
            session_id = %self.session_id,
            alert_id = %alert.id,
            kind = kind.as_str(),
            "alert cleared"
        );
        self.history.push(alert.clone());
        Some(self.event(AlertChange::Cleared, alert))
    }

    /// Steering became irregular while already fatigued: note it once
    fn corroborate_fatigue(&mut self, at_ms: u64) -> Option<AlertEvent> {
        let alert = self.open.get_mut(&AlertKind::Fatigue)?;
        if alert.corroborated {
            return None;
        }
        alert.corroborated = true;
        alert.updated_at_ms = at_ms;
        alert.message = format!(
            "{} Vehicle data corroborates: steering pattern has become irregular.",
            alert.message
        );
        let alert = alert.clone();
        Some(self.event(AlertChange::Escalated, alert))
    }

    /// Elevated-risk correlation while fatigued: note each pair once
    fn annotate_fatigue(&mut self, pair: &str, at_ms: u64) -> Option<AlertEvent> {
        let alert = self.open.get_mut(&AlertKind::Fatigue)?;
        if alert.correlated_pairs.iter().any(|p| p == pair) {
            return None;
        }
        alert.correlated_pairs.push(pair.to_string());
        alert.updated_at_ms = at_ms;
        alert.message = format!("{} Correlated signals: {}.", alert.message, pair);
        let alert = alert.clone();
        Some(self.event(AlertChange::Escalated, alert))
    }

    /// Raise (or re-declare) the emergency alert. Bypasses every debounce.
    pub fn declare_emergency(&mut self, reason: &str, at_ms: u64, source_sample_ms: u64) -> AlertEvent {
        let message = format!("Emergency declared: {}", reason);
        warn!(session_id = %self.session_id, reason, "emergency declared");
        metrics::counter!("monitor_emergencies_total").increment(1);

        if let Some(alert) = self.open.get_mut(&AlertKind::Emergency) {
            alert.message = message;
            alert.updated_at_ms = at_ms;
            alert.source_sample_ms = source_sample_ms;
            let alert = alert.clone();
            return self.event(AlertChange::Escalated, alert);
        }

        let alert = Alert::new(
            AlertKind::Emergency,
            Severity::Emergency,
            message,
            at_ms,
            source_sample_ms,
        );
        self.insert_raised(alert)
    }

    /// Mark an open alert acknowledged. Returns no event when it already was.
    pub fn acknowledge(&mut self, id: AlertId, at_ms: u64) -> Result<Option<AlertEvent>, AlertError> {
        let alert = self
            .open
            .values_mut()
            .find(|a| a.id == id)
            .ok_or(AlertError::UnknownAlert(id))?;
        if alert.acknowledged_at_ms.is_some() {
            return Ok(None);
        }
        alert.acknowledged_at_ms = Some(at_ms);
        info!(alert_id = %id, kind = alert.kind.as_str(), "alert acknowledged");
        let alert = alert.clone();
        Ok(Some(self.event(AlertChange::Acknowledged, alert)))
    }

    /// Clear an open alert on operator request
    pub fn clear(&mut self, id: AlertId, at_ms: u64) -> Result<AlertEvent, AlertError> {
        let kind = self
            .open
            .values()
            .find(|a| a.id == id)
            .map(|a| a.kind)
            .ok_or(AlertError::UnknownAlert(id))?;
        // The condition has to build up again before re-raising
        self.runs.remove(&kind);
        self.clear_kind(kind, at_ms)
            .ok_or(AlertError::UnknownAlert(id))
    }

    /// Snapshot of the open alerts
    pub fn open_alerts(&self) -> Vec<Alert> {
        self.open.values().cloned().collect()
    }

    pub fn open_alert(&self, id: AlertId) -> Option<&Alert> {
        self.open.values().find(|a| a.id == id)
    }

    pub fn open_alert_of(&self, kind: AlertKind) -> Option<&Alert> {
        self.open.get(&kind)
    }

    /// Cleared alerts, oldest first
    pub fn history(&self) -> &[Alert] {
        &self.history
    }

    /// Every alert of the session: cleared ones followed by open ones
    pub fn all_alerts(&self) -> Vec<Alert> {
        self.history
            .iter()
            .chain(self.open.values())
            .cloned()
            .collect()
    }

    fn event(&self, change: AlertChange, alert: Alert) -> AlertEvent {
        AlertEvent {
            session_id: self.session_id,
            change,
            alert,
        }
    }
}

/// Whether the reading carries the stream a flag-driven kind depends on
fn reading_covers(reading: &Reading, kind: AlertKind) -> bool {
    if kind.trigger_flags().iter().all(|f| f.is_driver_side()) {
        reading.driver.is_some()
    } else {
        reading.vehicle.is_some()
    }
}

fn fatigue_message() -> String {
    "Fatigue level rising. Take a break within 30 minutes.".to_string()
}

fn flag_message(kind: AlertKind, reading: &Reading) -> String {
    match kind {
        AlertKind::VitalSign => match &reading.driver {
            Some(d) => format!("Heart rate {} bpm outside the normal range.", d.heart_rate_bpm),
            None => "Vital sign outside the normal range.".to_string(),
        },
        AlertKind::SteeringAnomaly => {
            "Change in driving pattern detected from vehicle data. Possible fatigue.".to_string()
        }
        AlertKind::VibrationAnomaly => "Vehicle vibration level is high.".to_string(),
        AlertKind::CabinAirQuality => match &reading.vehicle {
            Some(v) => format!("Cabin CO2 at {:.0} ppm. Ventilate the cabin.", v.co2_ppm),
            None => "Cabin CO2 elevated. Ventilate the cabin.".to_string(),
        },
        AlertKind::Fatigue => fatigue_message(),
        AlertKind::Emergency => "Emergency".to_string(),
    }
}

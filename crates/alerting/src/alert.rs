//! Alert records and lifecycle events

use serde::{Deserialize, Serialize};
use telemetry::ConditionFlag;
use uuid::Uuid;

/// Unique per raise; a recurrence after clearing gets a new id
pub type AlertId = Uuid;

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    Fatigue,
    SteeringAnomaly,
    VibrationAnomaly,
    CabinAirQuality,
    VitalSign,
    /// Declared by the driver or an operator, never inferred
    Emergency,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Fatigue => "fatigue",
            AlertKind::SteeringAnomaly => "steering-anomaly",
            AlertKind::VibrationAnomaly => "vibration-anomaly",
            AlertKind::CabinAirQuality => "cabin-air-quality",
            AlertKind::VitalSign => "vital-sign",
            AlertKind::Emergency => "emergency",
        }
    }

    /// Kinds raised directly from condition flags
    pub const FLAG_DRIVEN: [AlertKind; 4] = [
        AlertKind::VitalSign,
        AlertKind::SteeringAnomaly,
        AlertKind::VibrationAnomaly,
        AlertKind::CabinAirQuality,
    ];

    /// Flags that trigger a flag-driven kind
    pub fn trigger_flags(&self) -> &'static [ConditionFlag] {
        match self {
            AlertKind::VitalSign => &[ConditionFlag::HrHigh, ConditionFlag::HrLow],
            AlertKind::SteeringAnomaly => &[ConditionFlag::SteeringIrregular],
            AlertKind::VibrationAnomaly => &[ConditionFlag::VibrationHigh],
            AlertKind::CabinAirQuality => &[ConditionFlag::Co2Elevated],
            AlertKind::Fatigue | AlertKind::Emergency => &[],
        }
    }

    /// Severity a sensor-driven alert of this kind is raised with.
    /// Sensor rules never reach `Emergency`.
    pub fn sensor_severity(&self) -> Severity {
        match self {
            AlertKind::Fatigue | AlertKind::SteeringAnomaly | AlertKind::VitalSign => {
                Severity::Warning
            }
            AlertKind::VibrationAnomaly | AlertKind::CabinAirQuality => Severity::Info,
            AlertKind::Emergency => Severity::Emergency,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Emergency,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Emergency => "emergency",
        }
    }
}

/// An alert raised during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub raised_at_ms: u64,
    /// Last time the triggering condition was observed
    pub updated_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared_at_ms: Option<u64>,
    /// Timestamp of the sample that raised the alert
    pub source_sample_ms: u64,
    /// Vehicle data corroborated a fatigue alert
    #[serde(default)]
    pub corroborated: bool,
    /// Correlation pairs noted against this alert
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlated_pairs: Vec<String>,
}

impl Alert {
    pub(crate) fn new(
        kind: AlertKind,
        severity: Severity,
        message: String,
        at_ms: u64,
        source_sample_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            message,
            raised_at_ms: at_ms,
            updated_at_ms: at_ms,
            acknowledged_at_ms: None,
            cleared_at_ms: None,
            source_sample_ms,
            corroborated: false,
            correlated_pairs: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.cleared_at_ms.is_none()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at_ms.is_some()
    }
}

/// Lifecycle change carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChange {
    Raised,
    Escalated,
    Acknowledged,
    Cleared,
}

impl AlertChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChange::Raised => "raised",
            AlertChange::Escalated => "escalated",
            AlertChange::Acknowledged => "acknowledged",
            AlertChange::Cleared => "cleared",
        }
    }
}

/// Event delivered to subscribers, carrying the full alert record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub session_id: Uuid,
    pub change: AlertChange,
    pub alert: Alert,
}

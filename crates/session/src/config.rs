//! Monitoring configuration

use crate::SessionError;
use alerting::AlertConfig;
use correlation::CorrelationConfig;
use data_validator::ValidationConfig;
use fatigue::FatigueConfig;
use serde::{Deserialize, Serialize};
use threshold_rules::ThresholdConfig;
use tracing::warn;

/// Configuration shared by every session of a manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Rolling window size in readings (60 = ~5 min at a 5 s cadence)
    pub window_capacity: usize,

    /// Maximum timestamp gap for a driver and a vehicle sample to pair (ms)
    pub pairing_tolerance_ms: u64,

    /// A source silent for longer than this is reported stale (ms)
    pub stale_after_ms: u64,

    /// Alert event channel capacity
    pub event_bus_capacity: usize,

    pub validation: ValidationConfig,
    pub thresholds: ThresholdConfig,
    pub fatigue: FatigueConfig,
    pub correlation: CorrelationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_capacity: 60,
            pairing_tolerance_ms: 2_500,
            stale_after_ms: 15_000,
            event_bus_capacity: 256,
            validation: ValidationConfig::default(),
            thresholds: ThresholdConfig::default(),
            fatigue: FatigueConfig::default(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Create strict config (slower to clear alerts)
    pub fn strict() -> Self {
        Self {
            fatigue: FatigueConfig::strict(),
            ..Default::default()
        }
    }

    /// Create lenient config (more evidence before alerting)
    pub fn lenient() -> Self {
        Self {
            fatigue: FatigueConfig::lenient(),
            ..Default::default()
        }
    }

    /// Flag-driven alerts share the classifier's debounce and cooldown
    pub fn alert_config(&self) -> AlertConfig {
        AlertConfig {
            debounce_threshold: self.fatigue.debounce_threshold,
            cooldown_threshold: self.fatigue.cooldown_threshold,
        }
    }

    /// Reject settings no session could run with
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.window_capacity == 0 {
            return Err(SessionError::Config("window_capacity must be > 0".into()));
        }
        if self.fatigue.debounce_threshold == 0 || self.fatigue.cooldown_threshold == 0 {
            return Err(SessionError::Config(
                "fatigue debounce and cooldown thresholds must be > 0".into(),
            ));
        }
        if self.correlation.min_samples < 3 {
            return Err(SessionError::Config(
                "correlation min_samples must be at least 3".into(),
            ));
        }
        if self.correlation.min_samples > self.window_capacity {
            warn!(
                min_samples = self.correlation.min_samples,
                window_capacity = self.window_capacity,
                "correlation can never leave insufficient-data with this window"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
        assert!(MonitorConfig::strict().validate().is_ok());
        assert!(MonitorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = MonitorConfig {
            window_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_alert_config_follows_fatigue() {
        let config = MonitorConfig::lenient();
        let alerts = config.alert_config();
        assert_eq!(alerts.debounce_threshold, 3);
        assert_eq!(alerts.cooldown_threshold, 2);
    }
}

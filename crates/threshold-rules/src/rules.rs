//! Rule table definitions

use serde::{Deserialize, Serialize};
use telemetry::{ConditionFlag, DriverSample, SteeringStability, VehicleSample, VibrationLevel};

/// Quantity a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HeartRate,
    EyeBlinkRate,
    GazeStability,
    /// 1.0 when steering is irregular, else 0.0
    SteeringIrregular,
    /// 1.0 when vibration is high, else 0.0
    VibrationHigh,
    Co2,
    /// Absolute deviation of seat pressure from its rolling average
    SeatPressureDeviation,
}

impl Metric {
    /// Read the metric from a driver sample, if it is a driver-side metric
    pub fn from_driver(&self, sample: &DriverSample) -> Option<f64> {
        match self {
            Metric::HeartRate => Some(sample.heart_rate_bpm as f64),
            Metric::EyeBlinkRate => sample.eye_blink_rate_index,
            Metric::GazeStability => sample.gaze_stability_index,
            _ => None,
        }
    }

    /// Read the metric from a vehicle sample, if it is a vehicle-side metric
    pub fn from_vehicle(&self, sample: &VehicleSample, seat_avg: Option<f64>) -> Option<f64> {
        match self {
            Metric::SteeringIrregular => {
                Some(indicator(sample.steering == SteeringStability::Irregular))
            }
            Metric::VibrationHigh => Some(indicator(sample.vibration == VibrationLevel::High)),
            Metric::Co2 => Some(sample.co2_ppm),
            Metric::SeatPressureDeviation => {
                seat_avg.map(|avg| (sample.seat_pressure_pct - avg).abs())
            }
            _ => None,
        }
    }
}

fn indicator(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Direction of a threshold comparison (strict)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    Below,
}

impl Comparison {
    pub fn holds(&self, value: f64, limit: f64) -> bool {
        match self {
            Comparison::Above => value > limit,
            Comparison::Below => value < limit,
        }
    }
}

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub flag: ConditionFlag,
    pub metric: Metric,
    pub comparison: Comparison,
    pub limit: f64,
}

impl ThresholdRule {
    pub fn new(flag: ConditionFlag, metric: Metric, comparison: Comparison, limit: f64) -> Self {
        Self {
            flag,
            metric,
            comparison,
            limit,
        }
    }
}

/// Threshold rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub rules: Vec<ThresholdRule>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        use Comparison::{Above, Below};
        use ConditionFlag as F;
        Self {
            rules: vec![
                ThresholdRule::new(F::HrHigh, Metric::HeartRate, Above, 90.0),
                ThresholdRule::new(F::HrLow, Metric::HeartRate, Below, 50.0),
                ThresholdRule::new(F::SteeringIrregular, Metric::SteeringIrregular, Above, 0.5),
                ThresholdRule::new(F::VibrationHigh, Metric::VibrationHigh, Above, 0.5),
                ThresholdRule::new(F::Co2Elevated, Metric::Co2, Above, 500.0),
                ThresholdRule::new(F::SeatPressureShift, Metric::SeatPressureDeviation, Above, 8.0),
                ThresholdRule::new(F::BlinkRateHigh, Metric::EyeBlinkRate, Above, 0.7),
                ThresholdRule::new(F::GazeUnstable, Metric::GazeStability, Below, 0.3),
            ],
        }
    }
}

impl ThresholdConfig {
    /// Replace the limit of every rule raising `flag`
    pub fn with_limit(mut self, flag: ConditionFlag, limit: f64) -> Self {
        for rule in self.rules.iter_mut().filter(|r| r.flag == flag) {
            rule.limit = limit;
        }
        self
    }
}

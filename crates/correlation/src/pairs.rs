//! Correlated variable pairs

use serde::{Deserialize, Serialize};
use telemetry::{ConditionFlag, Reading, SteeringStability, VibrationLevel};

/// A variable extracted from a paired reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairVariable {
    HeartRate,
    SpeedKmh,
    EngineRpm,
    EyeBlinkRate,
    GazeStability,
    /// 1.0 when steering is irregular
    SteeringIrregular,
    /// 1.0 when vibration is high
    VibrationHigh,
    /// Count of driver-side fatigue flags raised on the reading
    DriverFatigueFlags,
}

impl PairVariable {
    /// Extract the variable; `None` when the reading lacks the source sample
    /// or the optional field.
    pub fn extract(&self, reading: &Reading) -> Option<f64> {
        let driver = reading.driver.as_ref();
        let vehicle = reading.vehicle.as_ref();
        match self {
            PairVariable::HeartRate => driver.map(|d| d.heart_rate_bpm as f64),
            PairVariable::EyeBlinkRate => driver.and_then(|d| d.eye_blink_rate_index),
            PairVariable::GazeStability => driver.and_then(|d| d.gaze_stability_index),
            PairVariable::SpeedKmh => vehicle.map(|v| v.speed_kmh),
            PairVariable::EngineRpm => vehicle.map(|v| v.engine_rpm as f64),
            PairVariable::SteeringIrregular => {
                vehicle.map(|v| indicator(v.steering == SteeringStability::Irregular))
            }
            PairVariable::VibrationHigh => {
                vehicle.map(|v| indicator(v.vibration == VibrationLevel::High))
            }
            PairVariable::DriverFatigueFlags => driver.map(|_| {
                reading
                    .flags
                    .iter()
                    .filter(|f| driver_fatigue_flag(*f))
                    .count() as f64
            }),
        }
    }
}

// Steering is excluded so the fatigue/steering pair does not correlate
// a flag with itself
fn driver_fatigue_flag(flag: ConditionFlag) -> bool {
    flag.is_fatigue_relevant() && flag.is_driver_side()
}

fn indicator(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Sign of correlation that indicates elevated risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDirection {
    Positive,
    Negative,
}

/// A named pair of variables to correlate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub name: String,
    pub x: PairVariable,
    pub y: PairVariable,
    pub risk_direction: RiskDirection,
}

impl CorrelationPair {
    pub fn new(
        name: impl Into<String>,
        x: PairVariable,
        y: PairVariable,
        risk_direction: RiskDirection,
    ) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            risk_direction,
        }
    }

    /// Default pair table
    pub fn defaults() -> Vec<CorrelationPair> {
        use PairVariable as V;
        vec![
            Self::new("heartRate_vs_speed", V::HeartRate, V::SpeedKmh, RiskDirection::Positive),
            Self::new("heartRate_vs_load", V::HeartRate, V::EngineRpm, RiskDirection::Positive),
            Self::new(
                "blinkRate_vs_steering",
                V::EyeBlinkRate,
                V::SteeringIrregular,
                RiskDirection::Positive,
            ),
            Self::new(
                "gazeStability_vs_steering",
                V::GazeStability,
                V::SteeringIrregular,
                RiskDirection::Negative,
            ),
            Self::new(
                "fatigue_vs_steering",
                V::DriverFatigueFlags,
                V::SteeringIrregular,
                RiskDirection::Positive,
            ),
        ]
    }

    /// Extract the (x, y) point from a paired reading
    pub fn point(&self, reading: &Reading) -> Option<(f64, f64)> {
        if !reading.is_paired() {
            return None;
        }
        Some((self.x.extract(reading)?, self.y.extract(reading)?))
    }
}

//! Threshold evaluation

use crate::rules::{ThresholdConfig, ThresholdRule};
use telemetry::{DriverSample, FlagSet, Reading, VehicleSample};
use tracing::trace;

/// Stateless evaluator over a rule table
#[derive(Debug, Clone, Default)]
pub struct ThresholdEvaluator {
    rules: Vec<ThresholdRule>,
}

impl ThresholdEvaluator {
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            rules: config.rules,
        }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Flags raised by a driver sample alone
    pub fn evaluate_driver(&self, sample: &DriverSample) -> FlagSet {
        self.rules
            .iter()
            .filter(|rule| {
                rule.metric
                    .from_driver(sample)
                    .is_some_and(|v| rule.comparison.holds(v, rule.limit))
            })
            .map(|rule| rule.flag)
            .collect()
    }

    /// Flags raised by a vehicle sample alone.
    ///
    /// `seat_avg` is the rolling seat pressure average; without it the seat
    /// pressure rule is skipped.
    pub fn evaluate_vehicle(&self, sample: &VehicleSample, seat_avg: Option<f64>) -> FlagSet {
        self.rules
            .iter()
            .filter(|rule| {
                rule.metric
                    .from_vehicle(sample, seat_avg)
                    .is_some_and(|v| rule.comparison.holds(v, rule.limit))
            })
            .map(|rule| rule.flag)
            .collect()
    }

    /// Flags raised by every sample present in a reading
    pub fn evaluate(&self, reading: &Reading, seat_avg: Option<f64>) -> FlagSet {
        let driver = reading
            .driver
            .as_ref()
            .map(|d| self.evaluate_driver(d))
            .unwrap_or_default();
        let vehicle = reading
            .vehicle
            .as_ref()
            .map(|v| self.evaluate_vehicle(v, seat_avg))
            .unwrap_or_default();
        let flags = driver.union(vehicle);
        trace!(timestamp_ms = reading.timestamp_ms, flags = flags.len(), "reading evaluated");
        flags
    }
}

/// Mean seat pressure over the vehicle samples of the given readings
pub fn rolling_seat_pressure<'a>(readings: impl Iterator<Item = &'a Reading>) -> Option<f64> {
    let (sum, count) = readings
        .filter_map(|r| r.vehicle.as_ref())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v.seat_pressure_pct, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry::{ConditionFlag, SteeringStability, VibrationLevel};

    fn driver(hr: i32) -> DriverSample {
        DriverSample {
            heart_rate_bpm: hr,
            ..Default::default()
        }
    }

    #[test]
    fn test_heart_rate_flags() {
        let evaluator = ThresholdEvaluator::default();
        assert!(evaluator.evaluate_driver(&driver(72)).is_empty());
        assert!(evaluator.evaluate_driver(&driver(90)).is_empty());
        assert!(evaluator.evaluate_driver(&driver(91)).contains(ConditionFlag::HrHigh));
        assert!(evaluator.evaluate_driver(&driver(49)).contains(ConditionFlag::HrLow));
        assert!(evaluator.evaluate_driver(&driver(50)).is_empty());
    }

    #[test]
    fn test_vehicle_flags() {
        let evaluator = ThresholdEvaluator::default();
        let vehicle = VehicleSample {
            steering: SteeringStability::Irregular,
            vibration: VibrationLevel::High,
            co2_ppm: 650.0,
            ..Default::default()
        };
        let flags = evaluator.evaluate_vehicle(&vehicle, None);
        assert!(flags.contains(ConditionFlag::SteeringIrregular));
        assert!(flags.contains(ConditionFlag::VibrationHigh));
        assert!(flags.contains(ConditionFlag::Co2Elevated));
        assert!(!flags.contains(ConditionFlag::SeatPressureShift));
    }

    #[test]
    fn test_seat_pressure_shift_needs_average() {
        let evaluator = ThresholdEvaluator::default();
        let vehicle = VehicleSample {
            seat_pressure_pct: 60.0,
            ..Default::default()
        };
        assert!(evaluator.evaluate_vehicle(&vehicle, None).is_empty());
        assert!(evaluator
            .evaluate_vehicle(&vehicle, Some(82.0))
            .contains(ConditionFlag::SeatPressureShift));
        assert!(evaluator.evaluate_vehicle(&vehicle, Some(65.0)).is_empty());
    }

    #[test]
    fn test_optional_eye_metrics_skipped_when_absent() {
        let evaluator = ThresholdEvaluator::default();
        let mut sample = driver(72);
        assert!(evaluator.evaluate_driver(&sample).is_empty());

        sample.eye_blink_rate_index = Some(0.9);
        sample.gaze_stability_index = Some(0.1);
        let flags = evaluator.evaluate_driver(&sample);
        assert!(flags.contains(ConditionFlag::BlinkRateHigh));
        assert!(flags.contains(ConditionFlag::GazeUnstable));
    }

    #[test]
    fn test_reconfigured_limit() {
        let config = ThresholdConfig::default().with_limit(ConditionFlag::HrHigh, 100.0);
        let evaluator = ThresholdEvaluator::new(config);
        assert!(evaluator.evaluate_driver(&driver(95)).is_empty());
        assert!(evaluator.evaluate_driver(&driver(101)).contains(ConditionFlag::HrHigh));
    }

    #[test]
    fn test_reading_combines_both_streams() {
        let evaluator = ThresholdEvaluator::default();
        let reading = Reading::new(
            Some(driver(95)),
            Some(VehicleSample {
                steering: SteeringStability::Irregular,
                ..Default::default()
            }),
        );
        let flags = evaluator.evaluate(&reading, None);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.fatigue_relevant_count(), 2);
    }

    #[test]
    fn test_rolling_seat_pressure() {
        let readings: Vec<Reading> = [80.0, 84.0]
            .into_iter()
            .map(|pct| {
                Reading::new(
                    None,
                    Some(VehicleSample {
                        seat_pressure_pct: pct,
                        ..Default::default()
                    }),
                )
            })
            .chain(std::iter::once(Reading::new(Some(driver(70)), None)))
            .collect();
        assert_eq!(rolling_seat_pressure(readings.iter()), Some(82.0));
        assert_eq!(rolling_seat_pressure(std::iter::empty()), None);
    }

    #[test]
    fn test_rule_table_from_json() {
        let json = r#"{"rules":[{"flag":"co2-elevated","metric":"co2","comparison":"above","limit":800.0}]}"#;
        let config: ThresholdConfig = serde_json::from_str(json).unwrap();
        let evaluator = ThresholdEvaluator::new(config);
        let vehicle = VehicleSample {
            co2_ppm: 650.0,
            ..Default::default()
        };
        assert!(evaluator.evaluate_vehicle(&vehicle, None).is_empty());
    }
}

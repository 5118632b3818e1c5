//! Sample Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use telemetry::{DriverSample, Sample, VehicleSample};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Heart rate valid range (bpm)
    pub heart_rate_range: (f64, f64),
    /// Systolic blood pressure valid range (mmHg)
    pub systolic_range: (f64, f64),
    /// Diastolic blood pressure valid range (mmHg)
    pub diastolic_range: (f64, f64),
    /// Body temperature valid range (°C)
    pub body_temp_range: (f64, f64),
    /// Eye blink / gaze stability index range
    pub index_range: (f64, f64),
    /// Speed valid range (km/h)
    pub speed_range: (f64, f64),
    /// Engine RPM valid range
    pub rpm_range: (f64, f64),
    /// Seat pressure and fuel level range (%)
    pub percent_range: (f64, f64),
    /// Cabin temperature valid range (°C)
    pub cabin_temp_range: (f64, f64),
    /// CO2 concentration valid range (ppm)
    pub co2_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            heart_rate_range: (20.0, 250.0),
            systolic_range: (50.0, 260.0),
            diastolic_range: (30.0, 160.0),
            body_temp_range: (30.0, 45.0),
            index_range: (0.0, 1.0),
            speed_range: (0.0, 300.0),
            rpm_range: (0.0, 8000.0),
            percent_range: (0.0, 100.0),
            cabin_temp_range: (-40.0, 85.0),
            co2_range: (0.0, 40_000.0),
        }
    }
}

/// Range validator for driver and vehicle samples
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a sample from either stream
    pub fn validate(&self, sample: &Sample) -> Result<(), ValidationError> {
        match sample {
            Sample::Driver(driver) => self.validate_driver(driver),
            Sample::Vehicle(vehicle) => self.validate_vehicle(vehicle),
        }
    }

    /// Validate driver vital signs
    pub fn validate_driver(&self, sample: &DriverSample) -> Result<(), ValidationError> {
        let c = &self.config;
        self.validate_range("heart_rate_bpm", sample.heart_rate_bpm as f64, c.heart_rate_range)?;
        self.validate_range(
            "blood_pressure_systolic",
            sample.blood_pressure_systolic as f64,
            c.systolic_range,
        )?;
        self.validate_range(
            "blood_pressure_diastolic",
            sample.blood_pressure_diastolic as f64,
            c.diastolic_range,
        )?;
        self.validate_range("body_temperature_c", sample.body_temperature_c, c.body_temp_range)?;
        if let Some(blink) = sample.eye_blink_rate_index {
            self.validate_range("eye_blink_rate_index", blink, c.index_range)?;
        }
        if let Some(gaze) = sample.gaze_stability_index {
            self.validate_range("gaze_stability_index", gaze, c.index_range)?;
        }
        debug!(timestamp_ms = sample.timestamp_ms, "driver sample valid");
        Ok(())
    }

    /// Validate vehicle telemetry
    pub fn validate_vehicle(&self, sample: &VehicleSample) -> Result<(), ValidationError> {
        let c = &self.config;
        self.validate_range("speed_kmh", sample.speed_kmh, c.speed_range)?;
        self.validate_range("engine_rpm", sample.engine_rpm as f64, c.rpm_range)?;
        self.validate_range("seat_pressure_pct", sample.seat_pressure_pct, c.percent_range)?;
        self.validate_range("cabin_temp_c", sample.cabin_temp_c, c.cabin_temp_range)?;
        self.validate_range("co2_ppm", sample.co2_ppm, c.co2_range)?;
        self.validate_range("fuel_pct", sample.fuel_pct, c.percent_range)?;
        debug!(timestamp_ms = sample.timestamp_ms, "vehicle sample valid");
        Ok(())
    }

    /// Check that session-scoped event counters never go backwards
    pub fn validate_counters(
        &self,
        previous: &VehicleSample,
        current: &VehicleSample,
    ) -> Result<(), ValidationError> {
        if current.harsh_brake_event_count < previous.harsh_brake_event_count {
            return Err(ValidationError::CounterRegressed {
                field: "harsh_brake_event_count",
                previous: previous.harsh_brake_event_count,
                current: current.harsh_brake_event_count,
            });
        }
        if current.rapid_accel_event_count < previous.rapid_accel_event_count {
            return Err(ValidationError::CounterRegressed {
                field: "rapid_accel_event_count",
                previous: previous.rapid_accel_event_count,
                current: current.rapid_accel_event_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn driver(hr: i32) -> DriverSample {
        DriverSample {
            heart_rate_bpm: hr,
            ..Default::default()
        }
    }

    #[test]
    fn test_heart_rate_bounds_inclusive() {
        let validator = Validator::default();
        assert!(validator.validate_driver(&driver(20)).is_ok());
        assert!(validator.validate_driver(&driver(72)).is_ok());
        assert!(validator.validate_driver(&driver(250)).is_ok());
    }

    #[test]
    fn test_heart_rate_out_of_range() {
        let validator = Validator::default();
        let err = validator.validate_driver(&driver(19)).unwrap_err();
        assert_eq!(err.field(), "heart_rate_bpm");
        assert!(validator.validate_driver(&driver(251)).is_err());
    }

    #[test]
    fn test_non_finite_temperature() {
        let validator = Validator::default();
        let sample = DriverSample {
            body_temperature_c: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            validator.validate_driver(&sample),
            Err(ValidationError::NonFinite {
                field: "body_temperature_c"
            })
        );
    }

    #[test]
    fn test_optional_indices_checked_when_present() {
        let validator = Validator::default();
        let sample = DriverSample {
            eye_blink_rate_index: Some(1.4),
            ..Default::default()
        };
        assert!(validator.validate_driver(&sample).is_err());
        assert!(validator.validate_driver(&DriverSample::default()).is_ok());
    }

    #[test]
    fn test_vehicle_ranges() {
        let validator = Validator::default();
        assert!(validator.validate_vehicle(&VehicleSample::default()).is_ok());

        let negative_speed = VehicleSample {
            speed_kmh: -1.0,
            ..Default::default()
        };
        assert!(validator.validate_vehicle(&negative_speed).is_err());

        let seat = VehicleSample {
            seat_pressure_pct: 101.0,
            ..Default::default()
        };
        assert!(validator.validate_vehicle(&seat).is_err());

        let co2 = VehicleSample {
            co2_ppm: -5.0,
            ..Default::default()
        };
        assert!(validator.validate_vehicle(&co2).is_err());
    }

    #[test]
    fn test_counter_regression() {
        let validator = Validator::default();
        let previous = VehicleSample {
            harsh_brake_event_count: 3,
            ..Default::default()
        };
        let same = previous.clone();
        assert!(validator.validate_counters(&previous, &same).is_ok());

        let regressed = VehicleSample {
            harsh_brake_event_count: 2,
            ..Default::default()
        };
        assert!(matches!(
            validator.validate_counters(&previous, &regressed),
            Err(ValidationError::CounterRegressed {
                field: "harsh_brake_event_count",
                previous: 3,
                current: 2
            })
        ));
    }

    proptest! {
        #[test]
        fn heart_rate_outside_bounds_always_rejected(hr in prop_oneof![i32::MIN..20, 251..i32::MAX]) {
            let validator = Validator::default();
            let result = validator.validate(&Sample::Driver(driver(hr)));
            prop_assert!(result.is_err());
        }

        #[test]
        fn heart_rate_inside_bounds_accepted(hr in 20i32..=250) {
            let validator = Validator::default();
            prop_assert!(validator.validate(&Sample::Driver(driver(hr))).is_ok());
        }
    }
}

//! Sample definitions

use crate::FlagSet;
use serde::{Deserialize, Serialize};

/// Which acquisition stream a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Driver,
    Vehicle,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Driver => "driver",
            SourceKind::Vehicle => "vehicle",
        }
    }
}

/// Steering pattern reported by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringStability {
    #[default]
    Stable,
    Irregular,
}

/// Cabin vibration level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationLevel {
    #[default]
    Normal,
    High,
}

/// One reading of the driver's physiological state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSample {
    /// Acquisition time (Unix ms)
    pub timestamp_ms: u64,
    pub heart_rate_bpm: i32,
    pub blood_pressure_systolic: i32,
    pub blood_pressure_diastolic: i32,
    pub body_temperature_c: f64,
    /// Eye blink rate index, higher means more blinking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_blink_rate_index: Option<f64>,
    /// Gaze stability index (0 = wandering, 1 = fixed on road)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze_stability_index: Option<f64>,
}

impl Default for DriverSample {
    fn default() -> Self {
        Self {
            timestamp_ms: 0,
            heart_rate_bpm: 72,
            blood_pressure_systolic: 120,
            blood_pressure_diastolic: 80,
            body_temperature_c: 36.5,
            eye_blink_rate_index: None,
            gaze_stability_index: None,
        }
    }
}

/// One reading of the vehicle's operating telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSample {
    /// Acquisition time (Unix ms)
    pub timestamp_ms: u64,
    pub speed_kmh: f64,
    pub engine_rpm: u32,
    pub steering: SteeringStability,
    pub vibration: VibrationLevel,
    /// Driver seat pressure (0-100 %)
    pub seat_pressure_pct: f64,
    pub cabin_temp_c: f64,
    pub co2_ppm: f64,
    /// Fuel level (0-100 %)
    pub fuel_pct: f64,
    /// Harsh braking events since check-in
    pub harsh_brake_event_count: u32,
    /// Rapid acceleration events since check-in
    pub rapid_accel_event_count: u32,
    /// Last known position, if the vehicle reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Default for VehicleSample {
    fn default() -> Self {
        Self {
            timestamp_ms: 0,
            speed_kmh: 65.0,
            engine_rpm: 1800,
            steering: SteeringStability::Stable,
            vibration: VibrationLevel::Normal,
            seat_pressure_pct: 82.0,
            cabin_temp_c: 24.0,
            co2_ppm: 420.0,
            fuel_pct: 75.0,
            harsh_brake_event_count: 0,
            rapid_accel_event_count: 0,
            location: None,
        }
    }
}

/// A sample from either stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Sample {
    Driver(DriverSample),
    Vehicle(VehicleSample),
}

impl Sample {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Sample::Driver(s) => s.timestamp_ms,
            Sample::Vehicle(s) => s.timestamp_ms,
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            Sample::Driver(_) => SourceKind::Driver,
            Sample::Vehicle(_) => SourceKind::Vehicle,
        }
    }
}

impl From<DriverSample> for Sample {
    fn from(sample: DriverSample) -> Self {
        Sample::Driver(sample)
    }
}

impl From<VehicleSample> for Sample {
    fn from(sample: VehicleSample) -> Self {
        Sample::Vehicle(sample)
    }
}

/// Entry of the rolling window.
///
/// A reading is either a driver/vehicle pair acquired within the pairing
/// tolerance, or a single sample whose counterpart never arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Timestamp of the most recent sample in the reading
    pub timestamp_ms: u64,
    pub driver: Option<DriverSample>,
    pub vehicle: Option<VehicleSample>,
    /// Flags raised by threshold evaluation of this reading
    pub flags: FlagSet,
}

impl Reading {
    /// Build a reading from whatever samples are available
    pub fn new(driver: Option<DriverSample>, vehicle: Option<VehicleSample>) -> Self {
        let timestamp_ms = driver
            .as_ref()
            .map(|d| d.timestamp_ms)
            .max(vehicle.as_ref().map(|v| v.timestamp_ms))
            .unwrap_or(0);
        Self {
            timestamp_ms,
            driver,
            vehicle,
            flags: FlagSet::empty(),
        }
    }

    /// Both a driver and a vehicle sample are present
    pub fn is_paired(&self) -> bool {
        self.driver.is_some() && self.vehicle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_tagged_json() {
        let json = r#"{
            "source": "driver",
            "timestamp_ms": 1000,
            "heart_rate_bpm": 95,
            "blood_pressure_systolic": 125,
            "blood_pressure_diastolic": 82,
            "body_temperature_c": 36.6
        }"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.source(), SourceKind::Driver);
        assert_eq!(sample.timestamp_ms(), 1000);
        match sample {
            Sample::Driver(d) => {
                assert_eq!(d.heart_rate_bpm, 95);
                assert!(d.eye_blink_rate_index.is_none());
            }
            Sample::Vehicle(_) => panic!("expected driver sample"),
        }
    }

    #[test]
    fn test_vehicle_enums_snake_case() {
        let vehicle = VehicleSample {
            steering: SteeringStability::Irregular,
            vibration: VibrationLevel::High,
            ..Default::default()
        };
        let json = serde_json::to_value(Sample::from(vehicle)).unwrap();
        assert_eq!(json["source"], "vehicle");
        assert_eq!(json["steering"], "irregular");
        assert_eq!(json["vibration"], "high");
    }

    #[test]
    fn test_reading_timestamp_is_latest() {
        let driver = DriverSample {
            timestamp_ms: 5_000,
            ..Default::default()
        };
        let vehicle = VehicleSample {
            timestamp_ms: 6_200,
            ..Default::default()
        };
        let reading = Reading::new(Some(driver), Some(vehicle));
        assert!(reading.is_paired());
        assert_eq!(reading.timestamp_ms, 6_200);

        let single = Reading::new(None, Some(VehicleSample::default()));
        assert!(!single.is_paired());
    }
}

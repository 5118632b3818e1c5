//! Telemetry Records
//!
//! Sample types delivered by the acquisition layer:
//! - Driver vital signs (heart rate, blood pressure, temperature, eye metrics)
//! - Vehicle operating data (speed, steering, vibration, cabin air)
//!
//! Also defines the condition flag vocabulary and the `Reading`, the unit
//! stored in a session's rolling window.

mod flags;
mod sample;

pub use flags::{ConditionFlag, FlagSet};
pub use sample::{
    DriverSample, Reading, Sample, SourceKind, SteeringStability, VehicleSample, VibrationLevel,
};

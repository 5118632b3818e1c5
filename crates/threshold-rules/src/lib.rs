//! Threshold Rules
//!
//! Maps driver and vehicle samples to raw condition flags using a
//! reconfigurable rule table. Evaluation is pure: no state, no side effects.

mod evaluator;
mod rules;

pub use evaluator::{rolling_seat_pressure, ThresholdEvaluator};
pub use rules::{Comparison, Metric, ThresholdConfig, ThresholdRule};

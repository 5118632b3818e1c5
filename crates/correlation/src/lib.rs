//! Correlation Analysis
//!
//! Correlates driver vital signs with vehicle telemetry over the session's
//! rolling window:
//! - Heart rate vs speed and engine load
//! - Eye blink rate and gaze stability vs steering precision
//!
//! Only paired readings with every required field present take part.

mod analyzer;
mod pairs;
mod statistics;

pub use analyzer::{
    Confidence, CorrelationAnalyzer, CorrelationClass, CorrelationConfig, CorrelationResult,
};
pub use pairs::{CorrelationPair, PairVariable, RiskDirection};
pub use statistics::{pearson, sample_confidence};

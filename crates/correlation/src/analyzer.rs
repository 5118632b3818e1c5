//! Correlation Analyzer Implementation

use crate::pairs::{CorrelationPair, RiskDirection};
use crate::statistics::{pearson, sample_confidence};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use telemetry::Reading;
use tracing::debug;

/// Correlation analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum paired points before a coefficient is reported (default: 10)
    pub min_samples: usize,
    /// |r| at or above which a correlation is strong (default: 0.7)
    pub strong_threshold: f64,
    /// |r| at or above which a correlation is moderate (default: 0.4)
    pub moderate_threshold: f64,
    /// Variable pairs to analyse
    pub pairs: Vec<CorrelationPair>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            strong_threshold: 0.7,
            moderate_threshold: 0.4,
            pairs: CorrelationPair::defaults(),
        }
    }
}

/// Confidence of a correlation result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    /// Window holds fewer points than the configured minimum
    InsufficientData,
    /// Confidence score in [0, 1]
    Score(f64),
}

/// Classification label of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationClass {
    InsufficientData,
    /// One of the variables did not vary over the window
    Undefined,
    StrongPositive,
    ModeratePositive,
    Weak,
    ModerateNegative,
    StrongNegative,
}

impl CorrelationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationClass::InsufficientData => "insufficient-data",
            CorrelationClass::Undefined => "undefined",
            CorrelationClass::StrongPositive => "strong-positive",
            CorrelationClass::ModeratePositive => "moderate-positive",
            CorrelationClass::Weak => "weak",
            CorrelationClass::ModerateNegative => "moderate-negative",
            CorrelationClass::StrongNegative => "strong-negative",
        }
    }
}

/// Result for one variable pair over the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Pair name, e.g. `heartRate_vs_load`
    pub pair: String,
    /// Paired points used
    pub samples: usize,
    /// Pearson coefficient in [-1, 1]
    pub coefficient: Option<f64>,
    pub confidence: Confidence,
    pub classification: CorrelationClass,
    /// Strong correlation in the pair's risk direction
    pub elevated_risk: bool,
}

impl CorrelationResult {
    pub fn is_insufficient(&self) -> bool {
        matches!(self.confidence, Confidence::InsufficientData)
    }
}

/// Stateless analyzer over the session window.
///
/// Every call recomputes from the window contents, so the result always
/// reflects exactly what the window holds.
#[derive(Debug, Clone, Default)]
pub struct CorrelationAnalyzer {
    config: CorrelationConfig,
}

impl CorrelationAnalyzer {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Analyse every configured pair
    pub fn analyze(&self, window: &RingBuffer<Reading>) -> Vec<CorrelationResult> {
        self.config
            .pairs
            .iter()
            .map(|pair| self.analyze_pair(pair, window))
            .collect()
    }

    /// Analyse one pair over the paired readings of the window
    pub fn analyze_pair(
        &self,
        pair: &CorrelationPair,
        window: &RingBuffer<Reading>,
    ) -> CorrelationResult {
        let (xs, ys): (Vec<f64>, Vec<f64>) = window.iter().filter_map(|r| pair.point(r)).unzip();
        let samples = xs.len();

        if samples < self.config.min_samples {
            return CorrelationResult {
                pair: pair.name.clone(),
                samples,
                coefficient: None,
                confidence: Confidence::InsufficientData,
                classification: CorrelationClass::InsufficientData,
                elevated_risk: false,
            };
        }

        let coefficient = pearson(&xs, &ys);
        let classification = match coefficient {
            Some(r) => self.classify(r),
            None => CorrelationClass::Undefined,
        };
        let confidence = match coefficient {
            Some(_) => Confidence::Score(sample_confidence(samples)),
            None => Confidence::Score(0.0),
        };
        let elevated_risk = matches!(
            (pair.risk_direction, classification),
            (RiskDirection::Positive, CorrelationClass::StrongPositive)
                | (RiskDirection::Negative, CorrelationClass::StrongNegative)
        );

        debug!(
            pair = %pair.name,
            samples,
            coefficient = ?coefficient,
            class = classification.as_str(),
            "correlation computed"
        );

        CorrelationResult {
            pair: pair.name.clone(),
            samples,
            coefficient,
            confidence,
            classification,
            elevated_risk,
        }
    }

    fn classify(&self, r: f64) -> CorrelationClass {
        let magnitude = r.abs();
        if magnitude >= self.config.strong_threshold {
            if r > 0.0 {
                CorrelationClass::StrongPositive
            } else {
                CorrelationClass::StrongNegative
            }
        } else if magnitude >= self.config.moderate_threshold {
            if r > 0.0 {
                CorrelationClass::ModeratePositive
            } else {
                CorrelationClass::ModerateNegative
            }
        } else {
            CorrelationClass::Weak
        }
    }
}

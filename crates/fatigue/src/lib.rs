//! Fatigue Classification
//!
//! Two-state (normal / warning) driver fatigue classifier fed by the condition
//! flags of each reading:
//! - Debounce: several consecutive warning readings before entering warning
//! - Hysteresis: several consecutive flag-free readings before returning
//!   to normal

pub mod config;
pub mod state;

pub use config::FatigueConfig;
pub use state::{FatigueLevel, FatigueState, FatigueTransition};

use ring_buffer::RingBuffer;
use telemetry::Reading;
use tracing::{debug, info};

/// Stateful fatigue classifier, one per monitoring session
#[derive(Debug, Clone, Default)]
pub struct FatigueClassifier {
    config: FatigueConfig,
    state: FatigueState,
}

impl FatigueClassifier {
    pub fn new(config: FatigueConfig) -> Self {
        Self {
            config,
            state: FatigueState::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> &FatigueState {
        &self.state
    }

    pub fn config(&self) -> &FatigueConfig {
        &self.config
    }

    /// Whether a reading counts towards entering the warning state
    pub fn is_warning_reading(&self, reading: &Reading) -> bool {
        reading.flags.fatigue_relevant_count() >= self.config.min_relevant_flags
    }

    /// Advance the state machine with a new reading.
    ///
    /// `window` is the session's rolling window, already holding `reading`.
    pub fn observe(
        &mut self,
        reading: &Reading,
        window: &RingBuffer<Reading>,
    ) -> Option<FatigueTransition> {
        let relevant = reading.flags.fatigue_relevant_count();

        if self.is_warning_reading(reading) {
            self.state.consecutive_warning_samples += 1;
        } else {
            self.state.consecutive_warning_samples = 0;
        }

        // Without driver vitals a flag-free reading proves nothing; the clear
        // run only advances on readings that carry a driver sample
        if relevant > 0 {
            self.state.consecutive_clear_samples = 0;
        } else if reading.driver.is_some() {
            self.state.consecutive_clear_samples += 1;
        }

        self.state.window_flagged_ratio = self.flagged_ratio(window);

        let transition = match self.state.level {
            FatigueLevel::Normal
                if self.state.consecutive_warning_samples >= self.config.debounce_threshold =>
            {
                self.state.level = FatigueLevel::Warning;
                self.state.since_ms = reading.timestamp_ms;
                info!(
                    at_ms = reading.timestamp_ms,
                    consecutive = self.state.consecutive_warning_samples,
                    "fatigue level raised to warning"
                );
                Some(FatigueTransition::EnteredWarning {
                    at_ms: reading.timestamp_ms,
                })
            }
            FatigueLevel::Warning
                if self.state.consecutive_clear_samples >= self.config.cooldown_threshold =>
            {
                self.state.level = FatigueLevel::Normal;
                self.state.since_ms = reading.timestamp_ms;
                info!(at_ms = reading.timestamp_ms, "fatigue level back to normal");
                Some(FatigueTransition::ReturnedToNormal {
                    at_ms: reading.timestamp_ms,
                })
            }
            _ => None,
        };

        debug!(
            level = self.state.level.as_str(),
            relevant,
            warning_run = self.state.consecutive_warning_samples,
            clear_run = self.state.consecutive_clear_samples,
            "fatigue reading observed"
        );
        transition
    }

    fn flagged_ratio(&self, window: &RingBuffer<Reading>) -> f64 {
        if window.is_empty() {
            return 0.0;
        }
        let flagged = window.iter().filter(|r| self.is_warning_reading(r)).count();
        flagged as f64 / window.len() as f64
    }

    /// Reset state (on session end)
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

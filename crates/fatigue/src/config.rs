//! Fatigue classifier configuration

use serde::{Deserialize, Serialize};

/// Fatigue classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    /// Consecutive warning readings needed to enter the warning state
    pub debounce_threshold: u32,

    /// Consecutive flag-free readings needed to return to normal
    pub cooldown_threshold: u32,

    /// Simultaneous fatigue-relevant flags that make a reading a warning reading
    pub min_relevant_flags: usize,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            debounce_threshold: 2,
            cooldown_threshold: 3,
            min_relevant_flags: 2,
        }
    }
}

impl FatigueConfig {
    /// Create strict config (longer cooldown before clearing)
    pub fn strict() -> Self {
        Self {
            cooldown_threshold: 5,
            ..Default::default()
        }
    }

    /// Create lenient config (more evidence needed before warning)
    pub fn lenient() -> Self {
        Self {
            debounce_threshold: 3,
            cooldown_threshold: 2,
            ..Default::default()
        }
    }
}

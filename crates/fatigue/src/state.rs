//! Fatigue state tracking

use serde::{Deserialize, Serialize};

/// Fatigue level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    #[default]
    Normal,
    Warning,
}

impl FatigueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueLevel::Normal => "normal",
            FatigueLevel::Warning => "warning",
        }
    }
}

/// Driver fatigue state (tracked over time)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FatigueState {
    /// Current level
    pub level: FatigueLevel,

    /// Timestamp of the reading that caused the last transition (Unix ms)
    pub since_ms: u64,

    /// Consecutive readings with enough fatigue-relevant flags
    pub consecutive_warning_samples: u32,

    /// Consecutive readings without any fatigue-relevant flag
    pub consecutive_clear_samples: u32,

    /// Share of window readings that were warning readings
    pub window_flagged_ratio: f64,
}

/// A change of fatigue level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum FatigueTransition {
    EnteredWarning { at_ms: u64 },
    ReturnedToNormal { at_ms: u64 },
}

impl FatigueState {
    pub fn is_warning(&self) -> bool {
        self.level == FatigueLevel::Warning
    }

    /// Reset state (on session end)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

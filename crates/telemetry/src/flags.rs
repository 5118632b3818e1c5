//! Condition flags raised by threshold evaluation

use serde::{Deserialize, Serialize};

/// A single raw condition observed in a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ConditionFlag {
    HrHigh = 0,
    HrLow = 1,
    SteeringIrregular = 2,
    VibrationHigh = 3,
    Co2Elevated = 4,
    SeatPressureShift = 5,
    BlinkRateHigh = 6,
    GazeUnstable = 7,
}

impl ConditionFlag {
    pub const ALL: [ConditionFlag; 8] = [
        ConditionFlag::HrHigh,
        ConditionFlag::HrLow,
        ConditionFlag::SteeringIrregular,
        ConditionFlag::VibrationHigh,
        ConditionFlag::Co2Elevated,
        ConditionFlag::SeatPressureShift,
        ConditionFlag::BlinkRateHigh,
        ConditionFlag::GazeUnstable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionFlag::HrHigh => "hr-high",
            ConditionFlag::HrLow => "hr-low",
            ConditionFlag::SteeringIrregular => "steering-irregular",
            ConditionFlag::VibrationHigh => "vibration-high",
            ConditionFlag::Co2Elevated => "co2-elevated",
            ConditionFlag::SeatPressureShift => "seat-pressure-shift",
            ConditionFlag::BlinkRateHigh => "blink-rate-high",
            ConditionFlag::GazeUnstable => "gaze-unstable",
        }
    }

    /// Whether the flag counts towards fatigue classification.
    /// Cabin air quality is tracked on its own.
    pub fn is_fatigue_relevant(&self) -> bool {
        !matches!(self, ConditionFlag::Co2Elevated)
    }

    /// Flags derived from the driver stream (the rest come from the vehicle)
    pub fn is_driver_side(&self) -> bool {
        matches!(
            self,
            ConditionFlag::HrHigh
                | ConditionFlag::HrLow
                | ConditionFlag::BlinkRateHigh
                | ConditionFlag::GazeUnstable
        )
    }

    fn bit(&self) -> u16 {
        1 << (*self as u8)
    }
}

impl std::fmt::Display for ConditionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact set of condition flags (one bit per flag)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<ConditionFlag>", from = "Vec<ConditionFlag>")]
pub struct FlagSet(u16);

impl FlagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, flag: ConditionFlag) {
        self.0 |= flag.bit();
    }

    pub fn contains(&self, flag: ConditionFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(&self, other: FlagSet) -> FlagSet {
        FlagSet(self.0 | other.0)
    }

    /// Number of flags present that count towards fatigue
    pub fn fatigue_relevant_count(&self) -> usize {
        self.iter().filter(|f| f.is_fatigue_relevant()).count()
    }

    /// Iterate flags in declaration order
    pub fn iter(&self) -> impl Iterator<Item = ConditionFlag> + '_ {
        ConditionFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<ConditionFlag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = ConditionFlag>>(iter: I) -> Self {
        let mut set = FlagSet::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl From<Vec<ConditionFlag>> for FlagSet {
    fn from(flags: Vec<ConditionFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<FlagSet> for Vec<ConditionFlag> {
    fn from(set: FlagSet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = FlagSet::empty();
        assert!(set.is_empty());

        set.insert(ConditionFlag::HrHigh);
        set.insert(ConditionFlag::SteeringIrregular);
        set.insert(ConditionFlag::HrHigh);

        assert_eq!(set.len(), 2);
        assert!(set.contains(ConditionFlag::HrHigh));
        assert!(!set.contains(ConditionFlag::HrLow));
    }

    #[test]
    fn test_fatigue_relevant_count_ignores_co2() {
        let set: FlagSet = [ConditionFlag::Co2Elevated, ConditionFlag::VibrationHigh]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.fatigue_relevant_count(), 1);
    }

    #[test]
    fn test_serializes_as_flag_names() {
        let set: FlagSet = [ConditionFlag::Co2Elevated, ConditionFlag::HrHigh]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["hr-high","co2-elevated"]"#);

        let back: FlagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}

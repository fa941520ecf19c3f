//! Map a session duration to a 0-4 intensity level relative to a goal's own
//! percentile thresholds.

use super::percentiles::PercentileSet;
use crate::types::Record;
use serde::{Serialize, Serializer};

/// Relative effort bucket for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum IntensityLevel {
    /// No activity
    #[default]
    None = 0,
    /// At or below p25
    Light = 1,
    /// Above p25, at or below p50
    Moderate = 2,
    /// Above p50, at or below p75
    High = 3,
    /// Above p75
    Peak = 4,
}

impl IntensityLevel {
    pub const ALL: [IntensityLevel; 5] = [
        IntensityLevel::None,
        IntensityLevel::Light,
        IntensityLevel::Moderate,
        IntensityLevel::High,
        IntensityLevel::Peak,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Legend text for this level.
    pub fn description(self) -> &'static str {
        match self {
            IntensityLevel::None => "not performed",
            IntensityLevel::Light => "bottom 25%",
            IntensityLevel::Moderate => "25-50%",
            IntensityLevel::High => "50-75%",
            IntensityLevel::Peak => "top 25%",
        }
    }

    /// Single-cell shade for terminal grids.
    pub fn shade(self) -> char {
        match self {
            IntensityLevel::None => '·',
            IntensityLevel::Light => '░',
            IntensityLevel::Moderate => '▒',
            IntensityLevel::High => '▓',
            IntensityLevel::Peak => '█',
        }
    }
}

impl Serialize for IntensityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl std::fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Classify a duration against a goal's thresholds.
///
/// Bounds are inclusive on the upper side. With all-zero thresholds (no
/// history) any positive duration lands in `Peak`, since it exceeds p75 = 0.
pub fn classify(duration_minutes: u32, percentiles: &PercentileSet) -> IntensityLevel {
    if duration_minutes == 0 {
        IntensityLevel::None
    } else if duration_minutes <= percentiles.p25 {
        IntensityLevel::Light
    } else if duration_minutes <= percentiles.p50 {
        IntensityLevel::Moderate
    } else if duration_minutes <= percentiles.p75 {
        IntensityLevel::High
    } else {
        IntensityLevel::Peak
    }
}

/// Level for a stored record. Skipped records are always `None`.
pub fn level_for_record(record: &Record, percentiles: &PercentileSet) -> IntensityLevel {
    if record.is_completed() {
        classify(record.duration_minutes, percentiles)
    } else {
        IntensityLevel::None
    }
}

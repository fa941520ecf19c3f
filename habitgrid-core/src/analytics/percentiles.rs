//! Duration percentiles over a trailing window.
//!
//! Thresholds are nearest-rank selections into the sorted list of completed
//! session durations: index `floor(n * q)` for q in {0.25, 0.5, 0.75}. No
//! interpolation is done, so p25/p50/p75 are always durations that actually
//! occurred.

use crate::error::Error;
use crate::types::Record;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// p25/p50/p75 thresholds (minutes) for one goal's completed sessions.
///
/// All zeros with `total_records == 0` means "valid goal, no qualifying
/// records in the window".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileSet {
    pub p25: u32,
    pub p50: u32,
    pub p75: u32,
    /// Number of durations the thresholds were selected from
    pub total_records: usize,
}

impl PercentileSet {
    /// True if no history backed these thresholds.
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A window covering every representable date.
    pub fn all_time() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// User-facing trailing window presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1month")]
    OneMonth,
    #[default]
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1month",
            Period::ThreeMonths => "3months",
            Period::SixMonths => "6months",
            Period::OneYear => "1year",
        }
    }

    /// Display name (e.g., "3 months").
    pub fn label(&self) -> &'static str {
        match self {
            Period::OneMonth => "1 month",
            Period::ThreeMonths => "3 months",
            Period::SixMonths => "6 months",
            Period::OneYear => "1 year",
        }
    }

    fn months(&self) -> u32 {
        match self {
            Period::OneMonth => 1,
            Period::ThreeMonths => 3,
            Period::SixMonths => 6,
            Period::OneYear => 12,
        }
    }

    /// The window ending at `today`, starting the preset's calendar interval
    /// earlier. Month ends clamp to the shorter month instead of rolling over
    /// into the next one: May 31 minus 3 months is Feb 29 in 2024, not Mar 2.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        let start = today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN);
        DateWindow::new(start, today)
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                Error::invalid(
                    "period",
                    format!("\"{}\" (expected 1month, 3months, 6months or 1year)", s),
                )
            })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute p25/p50/p75 over one goal's records.
///
/// Only records that are completed, have a positive duration and fall inside
/// `[window_start, window_end]` contribute. Input order does not matter.
pub fn compute_percentiles(
    records: &[Record],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> PercentileSet {
    let window = DateWindow::new(window_start, window_end);
    percentiles_of(
        records
            .iter()
            .filter(|r| window.contains(r.date))
            .filter(|r| r.is_completed() && r.duration_minutes > 0)
            .map(|r| r.duration_minutes)
            .collect(),
    )
}

/// Like [`compute_percentiles`], restricted to `goal_id` out of a mixed list.
pub fn compute_goal_percentiles(
    records: &[Record],
    goal_id: &str,
    window: DateWindow,
) -> PercentileSet {
    percentiles_of(
        records
            .iter()
            .filter(|r| r.goal_id == goal_id && window.contains(r.date))
            .filter(|r| r.is_completed() && r.duration_minutes > 0)
            .map(|r| r.duration_minutes)
            .collect(),
    )
}

fn percentiles_of(mut durations: Vec<u32>) -> PercentileSet {
    let n = durations.len();
    if n == 0 {
        return PercentileSet::default();
    }

    durations.sort_unstable();

    // floor(n * 0.25), floor(n * 0.5), floor(n * 0.75); all < n for n >= 1
    PercentileSet {
        p25: durations[n / 4],
        p50: durations[n / 2],
        p75: durations[n * 3 / 4],
        total_records: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::intensity::{classify, IntensityLevel};
    use crate::analytics::test_support::{completed, day, skipped};

    #[test]
    fn test_nearest_rank_not_interpolated() {
        let records: Vec<_> = [10, 20, 30, 40]
            .iter()
            .enumerate()
            .map(|(i, &m)| completed("g", day(2024, 1, 1 + i as u32), m))
            .collect();

        let set = compute_percentiles(&records, day(2024, 1, 1), day(2024, 1, 31));
        assert_eq!(set.p25, 20);
        assert_eq!(set.p50, 30);
        assert_eq!(set.p75, 40);
        assert_eq!(set.total_records, 4);
    }

    #[test]
    fn test_order_independent() {
        let durations = [15, 45, 30, 60, 20];
        let forward: Vec<_> = durations
            .iter()
            .enumerate()
            .map(|(i, &m)| completed("g", day(2024, 3, 1 + i as u32), m))
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = compute_percentiles(&forward, day(2024, 1, 1), day(2024, 12, 31));
        let b = compute_percentiles(&backward, day(2024, 1, 1), day(2024, 12, 31));
        assert_eq!(a, b);
        assert_eq!((a.p25, a.p50, a.p75), (20, 30, 45));
    }

    #[test]
    fn test_session_ranks_against_its_history() {
        let records: Vec<_> = [15, 45, 30, 60, 20]
            .iter()
            .enumerate()
            .map(|(i, &m)| completed("g", day(2024, 3, 1 + i as u32), m))
            .collect();
        let set = compute_percentiles(&records, day(2024, 1, 1), day(2024, 12, 31));

        assert_eq!(classify(25, &set), IntensityLevel::Moderate);
        assert_eq!(classify(25, &set).as_u8(), 2);
    }

    #[test]
    fn test_filters_skipped_zero_and_out_of_window() {
        let records = vec![
            completed("g", day(2024, 2, 1), 50),
            completed("g", day(2024, 2, 2), 0),
            skipped("g", day(2024, 2, 3)),
            completed("g", day(2023, 12, 31), 999),
            completed("g", day(2024, 3, 1), 70),
        ];

        let set = compute_percentiles(&records, day(2024, 1, 1), day(2024, 3, 1));
        assert_eq!(set.total_records, 2);
        assert_eq!(set.p25, 50);
        assert_eq!(set.p50, 70);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let records = vec![
            completed("g", day(2024, 1, 1), 10),
            completed("g", day(2024, 1, 31), 20),
        ];
        let set = compute_percentiles(&records, day(2024, 1, 1), day(2024, 1, 31));
        assert_eq!(set.total_records, 2);
    }

    #[test]
    fn test_empty_is_all_zero() {
        let set = compute_percentiles(&[], day(2024, 1, 1), day(2024, 12, 31));
        assert_eq!(set, PercentileSet::default());
        assert!(set.is_empty());
    }

    #[test]
    fn test_single_record() {
        let records = vec![completed("g", day(2024, 5, 5), 33)];
        let set = compute_percentiles(&records, day(2024, 1, 1), day(2024, 12, 31));
        assert_eq!((set.p25, set.p50, set.p75), (33, 33, 33));
    }

    #[test]
    fn test_goal_filter() {
        let records = vec![
            completed("a", day(2024, 5, 1), 10),
            completed("b", day(2024, 5, 1), 500),
        ];
        let set = compute_goal_percentiles(&records, "a", DateWindow::all_time());
        assert_eq!(set.total_records, 1);
        assert_eq!(set.p75, 10);
    }

    #[test]
    fn test_period_windows() {
        let today = day(2024, 5, 31);
        assert_eq!(Period::OneMonth.window(today).start, day(2024, 4, 30));
        assert_eq!(Period::ThreeMonths.window(today).start, day(2024, 2, 29));
        assert_eq!(Period::SixMonths.window(today).start, day(2023, 11, 30));
        assert_eq!(Period::OneYear.window(today).start, day(2023, 5, 31));
        assert_eq!(Period::OneYear.window(today).end, today);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("3months".parse::<Period>().unwrap(), Period::ThreeMonths);
        assert_eq!("1year".parse::<Period>().unwrap(), Period::OneYear);
        assert!("2weeks".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::ThreeMonths);
    }

    #[test]
    fn test_percentile_json_keys() {
        let set = PercentileSet {
            p25: 1,
            p50: 2,
            p75: 3,
            total_records: 4,
        };
        let json = serde_json::to_value(set).unwrap();
        assert_eq!(json["totalRecords"], 4);
        assert_eq!(json["p50"], 2);
    }
}

//! Relative-performance analytics
//!
//! Everything here is derived from stored records and never persisted:
//!
//! - [`percentiles`]: p25/p50/p75 of a goal's completed durations in a window
//! - [`intensity`]: 0-4 level of a duration against those thresholds
//! - [`streaks`]: current and longest runs of consecutive completed days
//! - [`calendar`]: the per-day year grid
//! - [`overview`]: dashboard totals
//!
//! The pure functions take record slices and a reference date; [`StatsService`]
//! binds them to a [`Database`](crate::Database) and caches percentile sets.

pub mod cache;
pub mod calendar;
pub mod intensity;
pub mod overview;
pub mod percentiles;
pub mod service;
pub mod streaks;

pub use cache::PercentileCache;
pub use calendar::{build_year_grid, build_year_grid_with, CalendarDay, YearGrid};
pub use intensity::{classify, level_for_record, IntensityLevel};
pub use overview::{build_overview, month_bounds, Overview};
pub use percentiles::{compute_goal_percentiles, compute_percentiles, DateWindow, Period, PercentileSet};
pub use service::StatsService;
pub use streaks::{
    current_streak, current_streak_with_grace, longest_streak, streak_stats, StreakScope,
    StreakStats,
};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{Goal, Record, RecordStatus, DEFAULT_GOAL_COLOR};
    use chrono::{NaiveDate, Utc};

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn completed(goal_id: &str, date: NaiveDate, minutes: u32) -> Record {
        let now = Utc::now();
        Record {
            id: format!("{}-{}", goal_id, date),
            goal_id: goal_id.to_string(),
            user_id: "tester".to_string(),
            date,
            status: RecordStatus::Completed,
            duration_minutes: minutes,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn skipped(goal_id: &str, date: NaiveDate) -> Record {
        Record {
            status: RecordStatus::Skipped,
            duration_minutes: 0,
            ..completed(goal_id, date, 0)
        }
    }

    pub fn goal(id: &str) -> Goal {
        let now = Utc::now();
        Goal {
            id: id.to_string(),
            user_id: "tester".to_string(),
            name: id.to_string(),
            description: None,
            color: DEFAULT_GOAL_COLOR.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

//! Year-at-a-glance contribution grid.
//!
//! A [`YearGrid`] holds one representative record per day and the percentile
//! thresholds of every goal it shows. Days are produced lazily by
//! [`YearGrid::days`], which can be called any number of times.

use super::intensity::{level_for_record, IntensityLevel};
use super::percentiles::{compute_goal_percentiles, DateWindow, PercentileSet};
use crate::error::{Error, Result};
use crate::types::Record;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub level: IntensityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a Record>,
}

/// Per-day view of one calendar year.
#[derive(Debug, Clone)]
pub struct YearGrid<'a> {
    year: i32,
    first_day: NaiveDate,
    by_date: HashMap<NaiveDate, &'a Record>,
    percentiles: HashMap<&'a str, PercentileSet>,
}

impl<'a> YearGrid<'a> {
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Number of days in the year (365 or 366).
    pub fn day_count(&self) -> usize {
        self.days().count()
    }

    /// Every day from January 1 through December 31, in order.
    pub fn days(&self) -> impl Iterator<Item = CalendarDay<'a>> + '_ {
        let year = self.year;
        self.first_day
            .iter_days()
            .take_while(move |d| d.year() == year)
            .map(move |date| self.day(date))
    }

    /// The cell for a single date; dates outside the year come back empty.
    pub fn day(&self, date: NaiveDate) -> CalendarDay<'a> {
        let record = self.by_date.get(&date).copied();
        let level = record
            .map(|r| {
                let thresholds = self
                    .percentiles
                    .get(r.goal_id.as_str())
                    .copied()
                    .unwrap_or_default();
                level_for_record(r, &thresholds)
            })
            .unwrap_or_default();
        CalendarDay { date, level, record }
    }

    /// Thresholds used to classify a goal's days, if it appears in this year.
    pub fn percentiles_for(&self, goal_id: &str) -> Option<&PercentileSet> {
        self.percentiles.get(goal_id)
    }

    /// Days with a level above `None`.
    pub fn active_days(&self) -> usize {
        self.days()
            .filter(|d| d.level != IntensityLevel::None)
            .count()
    }

    /// Sum of completed minutes across the shown records.
    pub fn total_minutes(&self) -> u64 {
        self.by_date
            .values()
            .filter(|r| r.is_completed())
            .map(|r| u64::from(r.duration_minutes))
            .sum()
    }
}

/// Build the grid for `year`, using each goal's full history for thresholds.
///
/// With `goal_filter` set only that goal's records are shown; otherwise all
/// goals are merged and each day shows its representative record.
pub fn build_year_grid<'a>(
    records: &'a [Record],
    year: i32,
    goal_filter: Option<&str>,
) -> Result<YearGrid<'a>> {
    build_year_grid_with(records, year, goal_filter, |goal_id| {
        compute_goal_percentiles(records, goal_id, DateWindow::all_time())
    })
}

/// Like [`build_year_grid`], with thresholds supplied by the caller.
///
/// `percentiles_for` is called exactly once for each goal that has a record
/// in the year.
pub fn build_year_grid_with<'a, F>(
    records: &'a [Record],
    year: i32,
    goal_filter: Option<&str>,
    mut percentiles_for: F,
) -> Result<YearGrid<'a>>
where
    F: FnMut(&str) -> PercentileSet,
{
    let first_day = NaiveDate::from_ymd_opt(year, 1, 1)
        .filter(|_| NaiveDate::from_ymd_opt(year, 12, 31).is_some())
        .ok_or_else(|| Error::invalid("year", format!("{} is out of range", year)))?;

    let mut by_date: HashMap<NaiveDate, &'a Record> = HashMap::new();
    let mut percentiles: HashMap<&'a str, PercentileSet> = HashMap::new();

    let shown = records
        .iter()
        .filter(|r| r.date.year() == year)
        .filter(|r| goal_filter.map_or(true, |g| r.goal_id == g));

    for record in shown {
        percentiles
            .entry(record.goal_id.as_str())
            .or_insert_with(|| percentiles_for(&record.goal_id));

        by_date
            .entry(record.date)
            .and_modify(|current| {
                if representative_order(record, *current) == Ordering::Less {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    tracing::debug!(
        year,
        goal = goal_filter.unwrap_or("all"),
        days_with_records = by_date.len(),
        goals = percentiles.len(),
        "Built year grid"
    );

    Ok(YearGrid {
        year,
        first_day,
        by_date,
        percentiles,
    })
}

/// Ordering for picking one record per day when several goals collide.
///
/// `Less` wins: completed before skipped, then a positive duration before
/// zero minutes, then the most recently created, then the smallest id so the
/// choice never depends on input order.
fn representative_order(a: &Record, b: &Record) -> Ordering {
    b.is_completed()
        .cmp(&a.is_completed())
        .then_with(|| (b.duration_minutes > 0).cmp(&(a.duration_minutes > 0)))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

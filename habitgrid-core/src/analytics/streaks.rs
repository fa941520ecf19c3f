//! Consecutive-day streaks of completed activity.
//!
//! Only `COMPLETED` records count as activity. A skipped day is the same as a
//! missing day. Multiple records on one day (several goals in aggregate mode)
//! collapse to a single active day.

use crate::types::Record;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Which records a streak is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakScope<'a> {
    /// A single goal
    Goal(&'a str),
    /// Union of every goal: a day is active if any goal was completed
    All,
}

impl StreakScope<'_> {
    fn includes(&self, record: &Record) -> bool {
        match self {
            StreakScope::Goal(goal_id) => record.goal_id == *goal_id,
            StreakScope::All => true,
        }
    }
}

/// Streak summary for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    /// Consecutive active days ending exactly on the reference date
    pub current_streak: u32,
    /// Longest run of consecutive active days in the history
    pub longest_streak: u32,
    pub longest_start: Option<NaiveDate>,
    pub longest_end: Option<NaiveDate>,
    /// Distinct days with at least one completed record
    pub active_days: usize,
}

/// The longest run found in a set of active days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Run {
    pub length: u32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Distinct days with a completed record, ascending.
pub fn completed_days<'r>(records: impl IntoIterator<Item = &'r Record>) -> BTreeSet<NaiveDate> {
    records
        .into_iter()
        .filter(|r| r.is_completed())
        .map(|r| r.date)
        .collect()
}

/// Strict current streak: consecutive active days ending on `as_of`.
///
/// Returns 0 when `as_of` itself has no completed record, even if the days
/// just before it do. Records after `as_of` are ignored.
pub fn current_streak(records: &[Record], as_of: NaiveDate) -> u32 {
    count_back_from(&completed_days(records), as_of)
}

/// Current streak that tolerates an unlogged `as_of`.
///
/// If `as_of` has no completed record the count starts from the day before,
/// so a streak "still alive" until the end of today is reported.
pub fn current_streak_with_grace(records: &[Record], as_of: NaiveDate) -> u32 {
    let days = completed_days(records);
    if days.contains(&as_of) {
        return count_back_from(&days, as_of);
    }
    match as_of.pred_opt() {
        Some(yesterday) => count_back_from(&days, yesterday),
        None => 0,
    }
}

/// Length of the longest run of consecutive active days.
pub fn longest_streak(records: &[Record]) -> u32 {
    longest_run(&completed_days(records)).length
}

/// Longest run with its first and last day.
pub fn longest_run(days: &BTreeSet<NaiveDate>) -> Run {
    let mut best = Run::default();
    let mut run_start: Option<NaiveDate> = None;
    let mut run_len = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        let continues = prev.and_then(|p| p.succ_opt()) == Some(day);
        if continues {
            run_len += 1;
        } else {
            run_start = Some(day);
            run_len = 1;
        }

        // Strictly greater keeps the earliest run on ties
        if run_len > best.length {
            best = Run {
                length: run_len,
                start: run_start,
                end: Some(day),
            };
        }
        prev = Some(day);
    }

    best
}

/// Full streak summary for a scope, with the current streak anchored at `as_of`.
pub fn streak_stats(records: &[Record], scope: StreakScope<'_>, as_of: NaiveDate) -> StreakStats {
    let days = completed_days(records.iter().filter(|r| scope.includes(r)));
    let longest = longest_run(&days);

    StreakStats {
        current_streak: count_back_from(&days, as_of),
        longest_streak: longest.length,
        longest_start: longest.start,
        longest_end: longest.end,
        active_days: days.len(),
    }
}

fn count_back_from(days: &BTreeSet<NaiveDate>, start: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = Some(start);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        count += 1;
        day = d.pred_opt();
    }
    count
}

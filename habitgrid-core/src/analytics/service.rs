//! Request-scoped analytics over one user's stored data.
//!
//! [`StatsService`] loads the user's goals and records once, answers any
//! number of queries from those snapshots, and keeps a [`PercentileCache`].
//! Writes made through the service invalidate the affected cache entries and
//! the record snapshot, so later queries see the new data.

use super::cache::PercentileCache;
use super::calendar::{build_year_grid_with, YearGrid};
use super::overview::{build_overview, Overview};
use super::percentiles::{compute_goal_percentiles, DateWindow, Period, PercentileSet};
use super::streaks::{streak_stats, StreakScope, StreakStats};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{Goal, LoadState, Record, RecordFilter, RecordInput, RecordUpdate};
use chrono::NaiveDate;

pub struct StatsService<'db> {
    db: &'db Database,
    user_id: String,
    today: NaiveDate,
    goals: LoadState<Vec<Goal>>,
    records: LoadState<Vec<Record>>,
    cache: PercentileCache,
}

impl<'db> StatsService<'db> {
    /// Create a service for `user_id`, treating `today` as the reference date.
    pub fn new(db: &'db Database, user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            db,
            user_id: user_id.into(),
            today,
            goals: LoadState::NotLoaded,
            records: LoadState::NotLoaded,
            cache: PercentileCache::new(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// State of the record snapshot.
    pub fn records_state(&self) -> &LoadState<Vec<Record>> {
        &self.records
    }

    pub fn cache(&self) -> &PercentileCache {
        &self.cache
    }

    /// Every goal of the user, including inactive ones.
    pub fn goals(&mut self) -> Result<&[Goal]> {
        self.load_goals()?;
        Ok(snapshot(&self.goals))
    }

    /// Every record of the user, newest first.
    pub fn records(&mut self) -> Result<&[Record]> {
        self.load_records()?;
        Ok(snapshot(&self.records))
    }

    /// Look up a goal by exact id, exact name (case-insensitive) or unique id prefix.
    pub fn resolve_goal(&mut self, key: &str) -> Result<Goal> {
        self.load_goals()?;
        find_goal(snapshot(&self.goals), key)
    }

    /// Active goal count, completed records this month, aggregate current streak.
    pub fn overview(&mut self, grace_day: bool) -> Result<Overview> {
        self.load_goals()?;
        self.load_records()?;

        let overview = build_overview(
            snapshot(&self.goals),
            snapshot(&self.records),
            self.today,
            grace_day,
        );
        tracing::debug!(
            total_goals = overview.total_goals,
            monthly_records = overview.monthly_records,
            current_streak = overview.current_streak,
            "Computed overview"
        );
        Ok(overview)
    }

    /// Percentile thresholds of one goal over the trailing `period`.
    pub fn percentiles(&mut self, goal_id: &str, period: Period) -> Result<PercentileSet> {
        self.require_goal(goal_id)?;
        self.load_records()?;

        let window = period.window(self.today);
        let records = snapshot(&self.records);
        let set = self.cache.get_or_compute(goal_id, window, || {
            compute_goal_percentiles(records, goal_id, window)
        });
        Ok(set)
    }

    /// Current and longest streak for one goal or all goals combined.
    pub fn streaks(&mut self, scope: StreakScope<'_>) -> Result<StreakStats> {
        if let StreakScope::Goal(goal_id) = scope {
            self.require_goal(goal_id)?;
        }
        self.load_records()?;
        Ok(streak_stats(snapshot(&self.records), scope, self.today))
    }

    /// Year grid for one goal or all goals, thresholds from full history.
    pub fn calendar(&mut self, year: i32, goal_filter: Option<&str>) -> Result<YearGrid<'_>> {
        if let Some(goal_id) = goal_filter {
            self.require_goal(goal_id)?;
        }
        self.load_records()?;

        let records = snapshot(&self.records);
        let cache = &mut self.cache;
        build_year_grid_with(records, year, goal_filter, |goal_id| {
            cache.get_or_compute(goal_id, DateWindow::all_time(), || {
                compute_goal_percentiles(records, goal_id, DateWindow::all_time())
            })
        })
    }

    /// Records matching `filter`, read through to storage.
    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        self.db.list_records(&self.user_id, filter)
    }

    /// Create or replace the record for `(goal_id, date)`.
    pub fn log_record(&mut self, input: &RecordInput) -> Result<Record> {
        let record = self.db.upsert_record(&self.user_id, input)?;
        self.after_write(&record.goal_id);
        Ok(record)
    }

    pub fn update_record(&mut self, id: &str, update: &RecordUpdate) -> Result<Record> {
        let record = self
            .db
            .update_record(&self.user_id, id, update)?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        self.after_write(&record.goal_id);
        Ok(record)
    }

    pub fn delete_record(&mut self, id: &str) -> Result<Record> {
        let record = self
            .db
            .get_record(&self.user_id, id)?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        if !self.db.delete_record(&self.user_id, id)? {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        self.after_write(&record.goal_id);
        Ok(record)
    }

    fn after_write(&mut self, goal_id: &str) {
        self.cache.invalidate_goal(goal_id);
        self.records.invalidate();
    }

    fn require_goal(&mut self, goal_id: &str) -> Result<()> {
        self.load_goals()?;
        if snapshot(&self.goals).iter().any(|g| g.id == goal_id) {
            Ok(())
        } else {
            Err(Error::GoalNotFound(goal_id.to_string()))
        }
    }

    fn load_goals(&mut self) -> Result<()> {
        let (db, user_id) = (self.db, self.user_id.as_str());
        ensure_loaded(&mut self.goals, "goals", || db.list_goals(user_id, true))
    }

    fn load_records(&mut self) -> Result<()> {
        let (db, user_id) = (self.db, self.user_id.as_str());
        ensure_loaded(&mut self.records, "records", || {
            db.list_records(user_id, &RecordFilter::default())
        })
    }
}

/// Fetch into `state` unless it already holds data. A failed fetch is
/// recorded and retried on the next call.
fn ensure_loaded<T, F>(state: &mut LoadState<Vec<T>>, what: &str, fetch: F) -> Result<()>
where
    F: FnOnce() -> Result<Vec<T>>,
{
    if state.is_loaded() {
        return Ok(());
    }
    match fetch() {
        Ok(items) => {
            tracing::debug!(what, count = items.len(), "Loaded snapshot");
            *state = LoadState::Loaded(items);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(what, error = %e, "Failed to load snapshot");
            *state = LoadState::Failed(e.to_string());
            Err(e)
        }
    }
}

fn snapshot<T>(state: &LoadState<Vec<T>>) -> &[T] {
    state.as_loaded().map(Vec::as_slice).unwrap_or_default()
}

fn find_goal(goals: &[Goal], key: &str) -> Result<Goal> {
    if let Some(goal) = goals.iter().find(|g| g.id == key) {
        return Ok(goal.clone());
    }
    if let Some(goal) = goals.iter().find(|g| g.name.eq_ignore_ascii_case(key)) {
        return Ok(goal.clone());
    }

    let mut by_prefix = goals.iter().filter(|g| !key.is_empty() && g.id.starts_with(key));
    match (by_prefix.next(), by_prefix.next()) {
        (Some(goal), None) => Ok(goal.clone()),
        (Some(_), Some(_)) => Err(Error::invalid(
            "goal",
            format!("\"{}\" matches more than one goal id", key),
        )),
        _ => Err(Error::GoalNotFound(key.to_string())),
    }
}

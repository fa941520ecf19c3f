//! Core domain types for habitgrid
//!
//! These types represent the stored data model and the inputs used to change it.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Goal** | A named habit being tracked; owns zero or more Records |
//! | **Record** | One day's logged outcome for a Goal (completed/skipped + minutes) |
//! | **Owner** | The user id that goals and records are partitioned by |
//!
//! A Record is keyed naturally by `(goal_id, date)`: there is at most one record
//! per goal per calendar day, and logging the same day again replaces it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default color assigned to goals created without one.
pub const DEFAULT_GOAL_COLOR: &str = "green";

// ============================================
// Goal
// ============================================

/// A user-defined habit being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owner of this goal
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Display color name
    pub color: String,
    /// Inactive goals are hidden from default listings and overview counts
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a goal.
#[derive(Debug, Clone, Default)]
pub struct GoalInput {
    pub name: String,
    pub description: Option<String>,
    /// Falls back to [`DEFAULT_GOAL_COLOR`]
    pub color: Option<String>,
}

/// Partial update for a goal. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

impl GoalUpdate {
    /// True if the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.is_active.is_none()
    }
}

// ============================================
// Record
// ============================================

/// Outcome logged for a goal on a given day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// The habit was performed
    #[default]
    Completed,
    /// The habit was deliberately skipped
    Skipped,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Completed => "COMPLETED",
            RecordStatus::Skipped => "SKIPPED",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COMPLETED" => Ok(RecordStatus::Completed),
            "SKIPPED" => Ok(RecordStatus::Skipped),
            _ => Err(format!("unknown record status: {}", s)),
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day's logged outcome for a goal.
///
/// `date` is a calendar date with no time of day, so two records on the same
/// day always compare equal by date regardless of when they were written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning goal
    pub goal_id: String,
    /// Owner of this record
    pub user_id: String,
    /// Calendar day this record is for
    pub date: NaiveDate,
    pub status: RecordStatus,
    /// Minutes spent; only meaningful when `status` is `Completed`
    pub duration_minutes: u32,
    /// Free text, ignored by analytics
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// True if this record counts as activity for streaks and intensity.
    pub fn is_completed(&self) -> bool {
        self.status == RecordStatus::Completed
    }
}

/// Fields accepted when logging a record (upsert on `(goal_id, date)`).
#[derive(Debug, Clone)]
pub struct RecordInput {
    pub goal_id: String,
    pub date: NaiveDate,
    pub status: RecordStatus,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

impl RecordInput {
    /// A completed record with the given duration.
    pub fn completed(goal_id: impl Into<String>, date: NaiveDate, duration_minutes: u32) -> Self {
        Self {
            goal_id: goal_id.into(),
            date,
            status: RecordStatus::Completed,
            duration_minutes,
            notes: None,
        }
    }

    /// A skipped record (zero minutes).
    pub fn skipped(goal_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            goal_id: goal_id.into(),
            date,
            status: RecordStatus::Skipped,
            duration_minutes: 0,
            notes: None,
        }
    }
}

/// Partial update for a record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub status: Option<RecordStatus>,
    pub duration_minutes: Option<u32>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

/// Filter options for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Only records for this goal
    pub goal_id: Option<String>,
    /// Only records on exactly this day
    pub date: Option<NaiveDate>,
    /// Only records on or after this day
    pub since: Option<NaiveDate>,
    /// Only records on or before this day
    pub until: Option<NaiveDate>,
}

impl RecordFilter {
    /// Filter for all records of one goal.
    pub fn for_goal(goal_id: impl Into<String>) -> Self {
        Self {
            goal_id: Some(goal_id.into()),
            ..Default::default()
        }
    }
}

// ============================================
// Load state
// ============================================

/// Three-state holder for data fetched from storage.
///
/// Keeps "not fetched yet" distinct from "fetched and empty", so an empty
/// `Vec` always means the store really has nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    #[default]
    NotLoaded,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }

    /// Borrow the loaded value, if any.
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Reset to `NotLoaded` so the next access fetches again.
    pub fn invalidate(&mut self) {
        *self = LoadState::NotLoaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_roundtrip() {
        assert_eq!(
            "COMPLETED".parse::<RecordStatus>().unwrap(),
            RecordStatus::Completed
        );
        assert_eq!(
            "skipped".parse::<RecordStatus>().unwrap(),
            RecordStatus::Skipped
        );
        assert!("DONE".parse::<RecordStatus>().is_err());
        assert_eq!(RecordStatus::Skipped.as_str(), "SKIPPED");
    }

    #[test]
    fn test_record_status_serde() {
        let json = serde_json::to_string(&RecordStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        let parsed: RecordStatus = serde_json::from_str("\"SKIPPED\"").unwrap();
        assert_eq!(parsed, RecordStatus::Skipped);
    }

    #[test]
    fn test_load_state_distinguishes_empty() {
        let mut state: LoadState<Vec<i32>> = LoadState::default();
        assert!(!state.is_loaded());
        assert_eq!(state.as_loaded(), None);

        state = LoadState::Loaded(vec![]);
        assert!(state.is_loaded());
        assert_eq!(state.as_loaded(), Some(&vec![]));

        state.invalidate();
        assert_eq!(state, LoadState::NotLoaded);
    }

    #[test]
    fn test_goal_update_is_empty() {
        assert!(GoalUpdate::default().is_empty());
        let update = GoalUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}

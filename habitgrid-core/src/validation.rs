//! Boundary validation for goal and record input.
//!
//! Everything that reaches the database or the analytics engine has passed
//! through here first, so the core can assume well-formed values.

use crate::error::{Error, Result};
use crate::types::{GoalInput, GoalUpdate, RecordInput, RecordUpdate};
use chrono::NaiveDate;

/// Longest allowed goal name, in characters.
pub const MAX_GOAL_NAME_CHARS: usize = 100;
/// Longest allowed goal description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;
/// Longest allowed record note, in characters.
pub const MAX_NOTES_CHARS: usize = 1000;
/// A record cannot exceed one full day.
pub const MAX_DURATION_MINUTES: u32 = 1440;

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::invalid(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid("name", "is required"));
    }
    check_len("name", name, MAX_GOAL_NAME_CHARS)
}

fn check_duration(minutes: u32) -> Result<()> {
    if minutes > MAX_DURATION_MINUTES {
        return Err(Error::invalid(
            "duration_minutes",
            format!("cannot exceed {} minutes", MAX_DURATION_MINUTES),
        ));
    }
    Ok(())
}

/// Validate a new goal.
pub fn validate_goal_input(input: &GoalInput) -> Result<()> {
    check_name(&input.name)?;
    if let Some(description) = &input.description {
        check_len("description", description, MAX_DESCRIPTION_CHARS)?;
    }
    if let Some(color) = &input.color {
        if color.trim().is_empty() {
            return Err(Error::invalid("color", "must not be empty"));
        }
    }
    Ok(())
}

/// Validate a partial goal update.
pub fn validate_goal_update(update: &GoalUpdate) -> Result<()> {
    if let Some(name) = &update.name {
        check_name(name)?;
    }
    if let Some(Some(description)) = &update.description {
        check_len("description", description, MAX_DESCRIPTION_CHARS)?;
    }
    if let Some(color) = &update.color {
        if color.trim().is_empty() {
            return Err(Error::invalid("color", "must not be empty"));
        }
    }
    Ok(())
}

/// Validate a record before it is upserted.
pub fn validate_record_input(input: &RecordInput) -> Result<()> {
    if input.goal_id.trim().is_empty() {
        return Err(Error::invalid("goal_id", "a goal must be selected"));
    }
    check_duration(input.duration_minutes)?;
    if let Some(notes) = &input.notes {
        check_len("notes", notes, MAX_NOTES_CHARS)?;
    }
    Ok(())
}

/// Validate a partial record update.
pub fn validate_record_update(update: &RecordUpdate) -> Result<()> {
    if let Some(minutes) = update.duration_minutes {
        check_duration(minutes)?;
    }
    if let Some(Some(notes)) = &update.notes {
        check_len("notes", notes, MAX_NOTES_CHARS)?;
    }
    Ok(())
}

/// Parse a signed minute count coming from an untyped source.
///
/// Negative values are rejected rather than clamped.
pub fn parse_duration_minutes(value: i64) -> Result<u32> {
    if value < 0 {
        return Err(Error::invalid("duration_minutes", "cannot be negative"));
    }
    let minutes = u32::try_from(value).map_err(|_| {
        Error::invalid(
            "duration_minutes",
            format!("cannot exceed {} minutes", MAX_DURATION_MINUTES),
        )
    })?;
    check_duration(minutes)?;
    Ok(minutes)
}

/// Parse a calendar date given as `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 {
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
            return Ok(d);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        Error::invalid(
            "date",
            format!("\"{}\" (expected YYYYMMDD or YYYY-MM-DD)", s),
        )
    })
}

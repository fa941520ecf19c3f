//! Database repository layer
//!
//! Provides query and write operations for goals and records. Every query is
//! scoped by the owner's user id; rows belonging to other users behave as if
//! they did not exist.

use crate::error::{Error, Result};
use crate::types::*;
use crate::validation;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Storage format for record dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed-width timestamps so string order matches time order.
fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision `ts_to_sql` stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(
    row: &Row,
    column: &str,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    let idx = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn get_ts(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e))
}

fn get_date(row: &Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(row, column, e))
}

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Foreign keys are required for goal -> record cascades
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        super::schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ============================================
    // Goal operations
    // ============================================

    /// Create a new goal owned by `user_id`
    pub fn create_goal(&self, user_id: &str, input: &GoalInput) -> Result<Goal> {
        validation::validate_goal_input(input)?;

        let now = now();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            color: input
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_GOAL_COLOR.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goals (id, user_id, name, description, color, is_active,
                               created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                goal.id,
                goal.user_id,
                goal.name,
                goal.description,
                goal.color,
                goal.is_active,
                ts_to_sql(goal.created_at),
                ts_to_sql(goal.updated_at),
            ],
        )?;

        tracing::info!(goal_id = %goal.id, name = %goal.name, "Created goal");
        Ok(goal)
    }

    /// Get a goal by ID
    pub fn get_goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>> {
        let conn = self.conn()?;
        Self::query_goal(&conn, user_id, id)
    }

    fn query_goal(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Goal>> {
        conn.query_row(
            "SELECT * FROM goals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            Self::row_to_goal,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List goals, newest first. Inactive goals are skipped unless requested.
    pub fn list_goals(&self, user_id: &str, include_inactive: bool) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let sql = if include_inactive {
            "SELECT * FROM goals WHERE user_id = ?1 ORDER BY created_at DESC, id"
        } else {
            "SELECT * FROM goals WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at DESC, id"
        };

        let mut stmt = conn.prepare(sql)?;
        let goals = stmt
            .query_map([user_id], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Apply a partial update. Returns `None` if the goal does not exist.
    pub fn update_goal(
        &self,
        user_id: &str,
        id: &str,
        update: &GoalUpdate,
    ) -> Result<Option<Goal>> {
        validation::validate_goal_update(update)?;

        let conn = self.conn()?;
        let Some(mut goal) = Self::query_goal(&conn, user_id, id)? else {
            return Ok(None);
        };

        if update.is_empty() {
            return Ok(Some(goal));
        }

        if let Some(name) = &update.name {
            goal.name = name.trim().to_string();
        }
        if let Some(description) = &update.description {
            goal.description = description.clone();
        }
        if let Some(color) = &update.color {
            goal.color = color.clone();
        }
        if let Some(is_active) = update.is_active {
            goal.is_active = is_active;
        }
        goal.updated_at = now();

        conn.execute(
            r#"
            UPDATE goals
            SET name = ?1, description = ?2, color = ?3, is_active = ?4, updated_at = ?5
            WHERE id = ?6 AND user_id = ?7
            "#,
            params![
                goal.name,
                goal.description,
                goal.color,
                goal.is_active,
                ts_to_sql(goal.updated_at),
                goal.id,
                goal.user_id,
            ],
        )?;

        tracing::info!(goal_id = %goal.id, "Updated goal");
        Ok(Some(goal))
    }

    /// Delete a goal and, through the foreign key cascade, all of its records.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete_goal(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted > 0 {
            tracing::info!(goal_id = %id, "Deleted goal and its records");
        }
        Ok(deleted > 0)
    }

    fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
        Ok(Goal {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            color: row.get("color")?,
            is_active: row.get("is_active")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }

    // ============================================
    // Record operations
    // ============================================

    /// Insert or replace the record for `(goal_id, date)`.
    ///
    /// Status and duration are overwritten; notes are only overwritten when
    /// the input carries them. Fails with [`Error::GoalNotFound`] if the goal
    /// does not belong to `user_id`.
    pub fn upsert_record(&self, user_id: &str, input: &RecordInput) -> Result<Record> {
        validation::validate_record_input(input)?;

        let conn = self.conn()?;
        if Self::query_goal(&conn, user_id, &input.goal_id)?.is_none() {
            return Err(Error::GoalNotFound(input.goal_id.clone()));
        }

        let now = ts_to_sql(now());
        let date = date_to_sql(input.date);
        conn.execute(
            r#"
            INSERT INTO records (id, goal_id, user_id, date, status, duration_minutes,
                                 notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(goal_id, date) DO UPDATE SET
                status = excluded.status,
                duration_minutes = excluded.duration_minutes,
                notes = COALESCE(excluded.notes, records.notes),
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                input.goal_id,
                user_id,
                date,
                input.status.as_str(),
                input.duration_minutes,
                input.notes,
                now,
            ],
        )?;

        let record = conn.query_row(
            "SELECT * FROM records WHERE goal_id = ?1 AND date = ?2",
            params![input.goal_id, date],
            Self::row_to_record,
        )?;

        tracing::info!(
            record_id = %record.id,
            goal_id = %record.goal_id,
            date = %record.date,
            status = %record.status,
            duration_minutes = record.duration_minutes,
            "Upserted record"
        );
        Ok(record)
    }

    /// Get a record by ID
    pub fn get_record(&self, user_id: &str, id: &str) -> Result<Option<Record>> {
        let conn = self.conn()?;
        Self::query_record(&conn, user_id, id)
    }

    fn query_record(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Record>> {
        conn.query_row(
            "SELECT * FROM records WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            Self::row_to_record,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List records with optional filtering, newest date first
    pub fn list_records(&self, user_id: &str, filter: &RecordFilter) -> Result<Vec<Record>> {
        let conn = self.conn()?;

        let mut sql = String::from("SELECT * FROM records WHERE user_id = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(goal_id) = &filter.goal_id {
            sql.push_str(" AND goal_id = ?");
            params.push(Box::new(goal_id.clone()));
        }

        if let Some(date) = filter.date {
            sql.push_str(" AND date = ?");
            params.push(Box::new(date_to_sql(date)));
        }

        if let Some(since) = filter.since {
            sql.push_str(" AND date >= ?");
            params.push(Box::new(date_to_sql(since)));
        }

        if let Some(until) = filter.until {
            sql.push_str(" AND date <= ?");
            params.push(Box::new(date_to_sql(until)));
        }

        sql.push_str(" ORDER BY date DESC, created_at DESC, id");

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_refs.as_slice(), Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Apply a partial update. Returns `None` if the record does not exist.
    pub fn update_record(
        &self,
        user_id: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<Option<Record>> {
        validation::validate_record_update(update)?;

        let conn = self.conn()?;
        let Some(mut record) = Self::query_record(&conn, user_id, id)? else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(minutes) = update.duration_minutes {
            record.duration_minutes = minutes;
        }
        if let Some(notes) = &update.notes {
            record.notes = notes.clone();
        }
        record.updated_at = now();

        conn.execute(
            r#"
            UPDATE records
            SET status = ?1, duration_minutes = ?2, notes = ?3, updated_at = ?4
            WHERE id = ?5 AND user_id = ?6
            "#,
            params![
                record.status.as_str(),
                record.duration_minutes,
                record.notes,
                ts_to_sql(record.updated_at),
                record.id,
                record.user_id,
            ],
        )?;

        tracing::info!(record_id = %record.id, "Updated record");
        Ok(Some(record))
    }

    /// Delete a record. Returns `false` if there was nothing to delete.
    pub fn delete_record(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM records WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted > 0 {
            tracing::info!(record_id = %id, "Deleted record");
        }
        Ok(deleted > 0)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<Record> {
        let status_str: String = row.get("status")?;
        let status = status_str
            .parse::<RecordStatus>()
            .map_err(|e| conversion_error(row, "status", e))?;

        Ok(Record {
            id: row.get("id")?,
            goal_id: row.get("goal_id")?,
            user_id: row.get("user_id")?,
            date: get_date(row, "date")?,
            status,
            duration_minutes: row.get("duration_minutes")?,
            notes: row.get("notes")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

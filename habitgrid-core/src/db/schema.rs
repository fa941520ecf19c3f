//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Goals and daily records
    r#"
    CREATE TABLE IF NOT EXISTS goals (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        name             TEXT NOT NULL,
        description      TEXT,
        color            TEXT NOT NULL DEFAULT 'green',
        is_active        INTEGER NOT NULL DEFAULT 1,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, is_active);

    -- One record per goal per calendar day; the natural key drives upserts
    CREATE TABLE IF NOT EXISTS records (
        id               TEXT PRIMARY KEY,
        goal_id          TEXT NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
        user_id          TEXT NOT NULL,
        date             TEXT NOT NULL,      -- 'YYYY-MM-DD'
        status           TEXT NOT NULL,      -- 'COMPLETED', 'SKIPPED'
        duration_minutes INTEGER NOT NULL DEFAULT 0 CHECK (duration_minutes >= 0),
        notes            TEXT,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL,

        UNIQUE(goal_id, date)
    );

    CREATE INDEX IF NOT EXISTS idx_records_user_date ON records(user_id, date DESC);
    CREATE INDEX IF NOT EXISTS idx_records_goal_date ON records(goal_id, date);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

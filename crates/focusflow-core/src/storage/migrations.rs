//! Database schema migrations for focusflow.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: custom sessions and tasks.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS custom_sessions (
            seq      INTEGER PRIMARY KEY AUTOINCREMENT,
            id       TEXT NOT NULL UNIQUE,
            owner_id TEXT NOT NULL,
            name     TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS session_intervals (
            session_id    TEXT NOT NULL REFERENCES custom_sessions(id) ON DELETE CASCADE,
            position      INTEGER NOT NULL,
            interval_id   TEXT NOT NULL,
            label         TEXT NOT NULL DEFAULT '',
            duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
            kind          TEXT NOT NULL DEFAULT 'work',
            PRIMARY KEY (session_id, position)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id    TEXT PRIMARY KEY,
            title TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subtasks (
            task_id   TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            id        TEXT NOT NULL,
            position  INTEGER NOT NULL,
            title     TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            priority  TEXT NOT NULL DEFAULT 'medium',
            PRIMARY KEY (task_id, id)
        );

        CREATE INDEX IF NOT EXISTS idx_custom_sessions_owner ON custom_sessions(owner_id);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()?;
    debug!("applied schema v1");
    Ok(())
}

/// Migration v2: focus history.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS focus_log (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            technique          TEXT NOT NULL,
            session_name       TEXT NOT NULL DEFAULT '',
            task_id            TEXT,
            total_elapsed_secs INTEGER NOT NULL,
            cycle_count        INTEGER NOT NULL,
            subtasks_completed INTEGER NOT NULL DEFAULT 0,
            finished_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_focus_log_finished_at ON focus_log(finished_at);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()?;
    debug!("applied schema v2");
    Ok(())
}

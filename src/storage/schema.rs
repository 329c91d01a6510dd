//! Database schema definitions.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the issue store.
///
/// One row per issue document. Text fields use `NOT NULL DEFAULT ''` so
/// optional strings are never NULL.
pub const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        project TEXT NOT NULL,
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL,
        CHECK (length(id) = 24),
        CHECK (length(project) >= 1),
        CHECK (length(issue_title) >= 1),
        CHECK (length(issue_text) >= 1),
        CHECK (length(created_by) >= 1),
        CHECK (open IN (0, 1)),
        CHECK (created_on <= updated_on)
    );

    CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project);
    CREATE INDEX IF NOT EXISTS idx_issues_project_open ON issues(project, open);

    -- Every id ever handed out. Rows survive issue deletion so ids are never reused.
    CREATE TABLE IF NOT EXISTS allocated_ids (
        id TEXT PRIMARY KEY,
        allocated_on TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // WAL for file databases; in-memory databases report "memory" and ignore it.
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;

    Ok(())
}

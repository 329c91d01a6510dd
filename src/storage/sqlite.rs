//! `SQLite` storage implementation.

use crate::config::DatabaseLocation;
use crate::error::{IssueTrackerError, Result};
use crate::model::{FieldValue, Issue, IssueField};
use crate::storage::schema::apply_schema;
use crate::util::{format_timestamp, parse_timestamp};
use crate::validation::parse_filter_value;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Columns selected on every read. `project` is deliberately absent.
const ISSUE_COLUMNS: &str = "id, issue_title, issue_text, created_by, assigned_to, status_text, \
                             open, created_on, updated_on";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open whichever store `location` names.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_location(location: &DatabaseLocation, lock_timeout_ms: Option<u64>) -> Result<Self> {
        match location {
            DatabaseLocation::Memory => Self::open_memory(),
            DatabaseLocation::File(path) => Self::open_with_timeout(path, lock_timeout_ms),
        }
    }

    /// Run a write inside an immediate transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = f(&tx)?;

        tx.commit()?;
        tracing::trace!(op, "Committed mutation");

        Ok(result)
    }

    /// Insert a new issue. The record must carry its project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is missing or the row cannot be
    /// inserted (e.g. ID collision, constraint violation).
    pub fn create_issue(&mut self, issue: &Issue) -> Result<()> {
        let project = issue
            .project
            .as_deref()
            .ok_or_else(|| IssueTrackerError::validation("project", "is required"))?;

        self.mutate("create_issue", |tx| {
            tx.execute(
                "INSERT INTO allocated_ids (id, allocated_on) VALUES (?, ?)",
                rusqlite::params![issue.id, format_timestamp(&issue.created_on)],
            )?;
            tx.execute(
                "INSERT INTO issues (
                    id, project, issue_title, issue_text, created_by,
                    assigned_to, status_text, open, created_on, updated_on
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    issue.id,
                    project,
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    i32::from(issue.open),
                    format_timestamp(&issue.created_on),
                    format_timestamp(&issue.updated_on),
                ],
            )?;
            Ok(())
        })
    }

    /// Overwrite the mutable fields of an existing issue.
    ///
    /// `id`, `project` and `created_on` are never written. Returns `false`
    /// when no row with that id exists any more.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_issue(&mut self, issue: &Issue) -> Result<bool> {
        self.mutate("update_issue", |tx| {
            let changed = tx.execute(
                "UPDATE issues SET
                    issue_title = ?,
                    issue_text = ?,
                    created_by = ?,
                    assigned_to = ?,
                    status_text = ?,
                    open = ?,
                    updated_on = ?
                 WHERE id = ?",
                rusqlite::params![
                    issue.issue_title,
                    issue.issue_text,
                    issue.created_by,
                    issue.assigned_to,
                    issue.status_text,
                    i32::from(issue.open),
                    format_timestamp(&issue.updated_on),
                    issue.id,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Hard-delete an issue. Returns `false` if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_issue(&mut self, id: &str) -> Result<bool> {
        self.mutate("delete_issue", |tx| {
            let changed = tx.execute("DELETE FROM issues WHERE id = ?", [id])?;
            Ok(changed > 0)
        })
    }

    /// Get an issue by ID within a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_issue_in_project(&self, id: &str, project: &str) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ? AND project = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let issue = stmt
            .query_row([id, project], issue_from_row)
            .optional()?;
        Ok(issue)
    }

    /// List a project's issues matching all filters, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_issues(&self, project: &str, filters: &ListFilters) -> Result<Vec<Issue>> {
        if filters.match_nothing {
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(project.to_string())];

        for filter in &filters.conditions {
            let placeholders: Vec<&str> = filter.values.iter().map(|_| "?").collect();
            let _ = write!(
                sql,
                " AND {} IN ({})",
                filter.field.column(),
                placeholders.join(",")
            );
            for value in &filter.values {
                params.push(value_to_sql(value));
            }
        }

        sql.push_str(" ORDER BY rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let issues = stmt
            .query_map(params_refs.as_slice(), issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    /// Whether an ID has ever been assigned, including to deleted issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn id_exists(&self, id: &str) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM allocated_ids WHERE id = ?")?
            .exists([id])?;
        Ok(exists)
    }

    #[cfg(test)]
    pub(crate) fn count_issues(&self, project: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM issues WHERE project = ?",
            [project],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn value_to_sql(value: &FieldValue) -> Box<dyn rusqlite::ToSql> {
    match value {
        FieldValue::Text(text) => Box::new(text.clone()),
        FieldValue::Bool(flag) => Box::new(i32::from(*flag)),
        FieldValue::Timestamp(at) => Box::new(format_timestamp(at)),
    }
}

fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        project: None,
        issue_title: row.get(1)?,
        issue_text: row.get(2)?,
        created_by: row.get(3)?,
        assigned_to: row.get(4)?,
        status_text: row.get(5)?,
        open: row.get::<_, i32>(6)? != 0,
        created_on: timestamp_column(row, 7)?,
        updated_on: timestamp_column(row, 8)?,
    })
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}

/// One equality predicate: the field must equal any of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: IssueField,
    pub values: Vec<FieldValue>,
}

/// Filter options for listing issues.
///
/// Built from query-string pairs. Policy for input that can never match
/// (unknown field name, malformed id, uncastable boolean or timestamp):
/// the whole filter matches nothing rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub conditions: Vec<FieldFilter>,
    pub match_nothing: bool,
}

impl ListFilters {
    /// Build filters from `key=value` pairs. Repeated keys accept any of
    /// their values.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();
        let mut seen: Vec<(IssueField, bool)> = Vec::new();

        for (key, value) in pairs {
            let Some(field) = IssueField::from_name(key.as_ref()) else {
                filters.match_nothing = true;
                continue;
            };
            let parsed = parse_filter_value(field, value.as_ref());

            match seen.iter_mut().find(|(f, _)| *f == field) {
                Some(entry) => entry.1 |= parsed.is_some(),
                None => seen.push((field, parsed.is_some())),
            }

            if let Some(parsed) = parsed {
                filters.push(field, parsed);
            }
        }

        if seen.iter().any(|(_, any_valid)| !any_valid) {
            filters.match_nothing = true;
        }

        filters
    }

    /// Require `field` to equal `value` (or any other value already given).
    pub fn push(&mut self, field: IssueField, value: FieldValue) {
        if let Some(existing) = self.conditions.iter_mut().find(|c| c.field == field) {
            if !existing.values.contains(&value) {
                existing.values.push(value);
            }
        } else {
            self.conditions.push(FieldFilter {
                field,
                values: vec![value],
            });
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.conditions.is_empty() && !self.match_nothing
    }
}

//! Issue operations on top of the store.
//!
//! [`IssueManager`] owns the storage connection and is the only thing the
//! HTTP layer talks to. It turns raw client fields into validated records,
//! assigns ids and timestamps, and maps "absent" into typed errors.

use crate::error::{IssueTrackerError, Result};
use crate::model::{Issue, RawFields};
use crate::storage::{ListFilters, SqliteStorage};
use crate::util::{IdGenerator, is_valid_id_format, next_update_time, normalize_id, now_millis};
use crate::validation::IssueValidator;

/// Project-scoped CRUD over issues.
#[derive(Debug)]
pub struct IssueManager {
    storage: SqliteStorage,
    ids: IdGenerator,
}

impl IssueManager {
    #[must_use]
    pub const fn new(storage: SqliteStorage) -> Self {
        Self {
            storage,
            ids: IdGenerator::new(),
        }
    }

    #[cfg(test)]
    const fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// All issues of `project` matching `filters`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn list_for_project(&self, project: &str, filters: &ListFilters) -> Result<Vec<Issue>> {
        let issues = self.storage.list_issues(project, filters)?;
        tracing::debug!(project, count = issues.len(), "Listed issues");
        Ok(issues)
    }

    /// Look up one issue by id inside `project`.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` for a malformed id, an unknown id, or an id
    /// that belongs to another project. Store failures pass through.
    pub fn find_by_id_in_project(&self, id: &str, project: &str) -> Result<Issue> {
        let id = normalize_id(id);
        if !is_valid_id_format(&id) {
            tracing::debug!(id = %id, "Rejected malformed issue id");
            return Err(IssueTrackerError::IssueNotFound { id });
        }

        self.storage
            .get_issue_in_project(&id, project)?
            .ok_or(IssueTrackerError::IssueNotFound { id })
    }

    /// Create an issue in `project` from submitted fields.
    ///
    /// The returned record carries `project`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if required fields are missing or values
    /// cannot be cast, or a store error if the insert fails.
    pub fn create(&mut self, project: &str, fields: &RawFields) -> Result<Issue> {
        let new_issue = IssueValidator::validate_new(project, fields)
            .map_err(IssueTrackerError::from_validation_errors)?;

        let now = now_millis();
        let id = self.allocate_id(
            &new_issue.project,
            &new_issue.issue_title,
            &new_issue.created_by,
            now,
        )?;

        let issue = new_issue.into_issue(id, now);
        IssueValidator::validate(&issue).map_err(IssueTrackerError::from_validation_errors)?;

        self.storage.create_issue(&issue)?;
        tracing::info!(id = %issue.id, project, "Created issue");

        Ok(issue)
    }

    /// Apply submitted fields onto `existing` and persist the result.
    ///
    /// `updated_on` always moves strictly forward.
    ///
    /// # Errors
    ///
    /// Returns a validation error for uncastable values or a record that
    /// would break an invariant, `IssueNotFound` if the issue vanished
    /// since it was read, or a store error.
    pub fn update(&mut self, existing: Issue, fields: &RawFields) -> Result<Issue> {
        let patch = IssueValidator::validate_patch(fields)
            .map_err(IssueTrackerError::from_validation_errors)?;

        let mut issue = existing;
        patch.apply_to(&mut issue);
        issue.updated_on = next_update_time(issue.updated_on);
        IssueValidator::validate(&issue).map_err(IssueTrackerError::from_validation_errors)?;

        if !self.storage.update_issue(&issue)? {
            return Err(IssueTrackerError::IssueNotFound { id: issue.id });
        }
        tracing::info!(id = %issue.id, "Updated issue");

        Ok(issue)
    }

    /// Hard-delete `issue`.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if it was already gone, or a store error.
    pub fn remove(&mut self, issue: &Issue) -> Result<()> {
        if !self.storage.delete_issue(&issue.id)? {
            return Err(IssueTrackerError::IssueNotFound {
                id: issue.id.clone(),
            });
        }
        tracing::info!(id = %issue.id, "Deleted issue");
        Ok(())
    }

    fn allocate_id(
        &self,
        project: &str,
        title: &str,
        creator: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<String> {
        let mut lookup_error = None;
        let id = self.ids.generate(project, title, creator, now, |candidate| {
            match self.storage.id_exists(candidate) {
                Ok(taken) => taken,
                Err(err) => {
                    lookup_error.get_or_insert(err);
                    true
                }
            }
        });

        if let Some(err) = lookup_error {
            return Err(err);
        }
        id.ok_or_else(|| anyhow::anyhow!("could not allocate a unique issue id").into())
    }
}

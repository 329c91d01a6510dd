//! Core data types for `issue_tracker`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Issue` - The tracked work item
//! - `IssueField` - The closed set of field names clients may address
//! - `NewIssue` - Validated creation data
//! - `IssuePatch` - Validated update data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::time::{deserialize_timestamp, serialize_timestamp};

/// Untyped field map as submitted by a client (form or JSON body).
pub type RawFields = serde_json::Map<String, serde_json::Value>;

/// A tracked issue.
///
/// `project` is only populated when the record was just created; reads
/// project it away so it never appears in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub status_text: String,
    pub open: bool,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_on: DateTime<Utc>,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub updated_on: DateTime<Utc>,
}

/// Field names a client can use in filters and bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Id,
    Project,
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
    Open,
    CreatedOn,
    UpdatedOn,
}

/// The typed shape of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Timestamp,
}

impl IssueField {
    pub const ALL: [Self; 10] = [
        Self::Id,
        Self::Project,
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
        Self::Open,
        Self::CreatedOn,
        Self::UpdatedOn,
    ];

    /// Wire name of the field (`_id` for the identifier).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::Project => "project",
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
            Self::Open => "open",
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
        }
    }

    /// Resolve a wire name. Unknown names return `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    /// Storage column backing this field.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            other => other.as_str(),
        }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Open => FieldKind::Bool,
            Self::CreatedOn | Self::UpdatedOn => FieldKind::Timestamp,
            _ => FieldKind::Text,
        }
    }

    /// Whether an update may change this field.
    #[must_use]
    pub const fn is_updatable(self) -> bool {
        matches!(
            self,
            Self::IssueTitle
                | Self::IssueText
                | Self::CreatedBy
                | Self::AssignedTo
                | Self::StatusText
                | Self::Open
        )
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value a field can be compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// Validated data for a new issue, before the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
}

impl NewIssue {
    /// Build the stored record from this data.
    #[must_use]
    pub fn into_issue(self, id: String, now: DateTime<Utc>) -> Issue {
        Issue {
            id,
            project: Some(self.project),
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            open: self.open,
            created_on: now,
            updated_on: now,
        }
    }
}

/// Validated set of field changes for an existing issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePatch {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

impl IssuePatch {
    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }

    /// Apply the changes onto `issue`. Identity and timestamps are untouched.
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(ref value) = self.issue_title {
            issue.issue_title.clone_from(value);
        }
        if let Some(ref value) = self.issue_text {
            issue.issue_text.clone_from(value);
        }
        if let Some(ref value) = self.created_by {
            issue.created_by.clone_from(value);
        }
        if let Some(ref value) = self.assigned_to {
            issue.assigned_to.clone_from(value);
        }
        if let Some(ref value) = self.status_text {
            issue.status_text.clone_from(value);
        }
        if let Some(open) = self.open {
            issue.open = open;
        }
    }
}

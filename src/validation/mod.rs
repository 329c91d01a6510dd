//! Validation helpers for `issue_tracker`.
//!
//! These routines turn untyped client input (form or JSON field maps) into
//! typed domain values and enforce the issue invariants. They return
//! structured validation errors without touching storage.
//!
//! Casting rules:
//! - text fields accept strings, numbers and booleans (stringified); arrays
//!   and objects are rejected
//! - `open` accepts `true`/`false`, `1`/`0`, and the strings `"true"`,
//!   `"false"`, `"1"`, `"0"`, `"yes"`, `"no"`
//! - `null` and empty strings count as "not sent"; whitespace is a value

use crate::error::ValidationError;
use crate::model::{FieldKind, FieldValue, Issue, IssueField, IssuePatch, NewIssue, RawFields};
use crate::util::{is_valid_id_format, normalize_id, parse_timestamp};
use serde_json::Value;

const TRUE_STRINGS: [&str; 3] = ["true", "1", "yes"];
const FALSE_STRINGS: [&str; 3] = ["false", "0", "no"];

/// Returns true when the value carries no information (`null` or `""`).
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Cast a raw value to text.
///
/// # Errors
///
/// Returns a `ValidationError` for arrays and objects.
pub fn cast_text(field: IssueField, value: &Value) -> Result<Option<String>, ValidationError> {
    if is_blank(value) {
        return Ok(None);
    }
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(ValidationError::new(field.as_str(), "expected a string")),
    }
}

/// Cast a raw value to a boolean.
///
/// # Errors
///
/// Returns a `ValidationError` when the value is not one of the accepted
/// boolean spellings.
pub fn cast_bool(field: IssueField, value: &Value) -> Result<Option<bool>, ValidationError> {
    if is_blank(value) {
        return Ok(None);
    }
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => parse_bool_str(s.trim()),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| ValidationError::new(field.as_str(), "expected a boolean"))
}

fn parse_bool_str(s: &str) -> Option<bool> {
    if TRUE_STRINGS.contains(&s) {
        Some(true)
    } else if FALSE_STRINGS.contains(&s) {
        Some(false)
    } else {
        None
    }
}

/// Parse a query-string value into the typed value for `field`.
///
/// Returns `None` when the value cannot possibly match (malformed id,
/// uncastable boolean or timestamp).
#[must_use]
pub fn parse_filter_value(field: IssueField, raw: &str) -> Option<FieldValue> {
    match field.kind() {
        FieldKind::Bool => parse_bool_str(raw.trim()).map(FieldValue::Bool),
        FieldKind::Timestamp => parse_timestamp(raw).map(FieldValue::Timestamp),
        FieldKind::Text if field == IssueField::Id => {
            let id = normalize_id(raw);
            is_valid_id_format(&id).then_some(FieldValue::Text(id))
        }
        FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
    }
}

/// Extract the `_id` a client addressed, if any.
///
/// Numbers are accepted and stringified; blank values count as absent.
#[must_use]
pub fn extract_id(fields: &RawFields) -> Option<String> {
    match fields.get(IssueField::Id.as_str())? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether the map carries at least one non-blank updatable field.
#[must_use]
pub fn has_update_fields(fields: &RawFields) -> bool {
    fields.iter().any(|(name, value)| {
        IssueField::from_name(name).is_some_and(IssueField::is_updatable) && !is_blank(value)
    })
}

/// Validates issue input and invariants.
pub struct IssueValidator;

impl IssueValidator {
    /// Build a `NewIssue` from submitted fields for `project`.
    ///
    /// Unknown fields are ignored. A `project` in the body never overrides
    /// the project the request addressed.
    ///
    /// # Errors
    ///
    /// Returns every validation error found: missing/empty required fields
    /// and values that cannot be cast to their field's type.
    pub fn validate_new(project: &str, fields: &RawFields) -> Result<NewIssue, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if project.is_empty() {
            errors.push(ValidationError::new("project", "is required"));
        }

        let mut required = |field: IssueField| -> String {
            match fields.get(field.as_str()).map(|v| cast_text(field, v)) {
                Some(Ok(Some(text))) => text,
                Some(Err(err)) => {
                    errors.push(err);
                    String::new()
                }
                Some(Ok(None)) | None => {
                    errors.push(ValidationError::new(field.as_str(), "is required"));
                    String::new()
                }
            }
        };
        let issue_title = required(IssueField::IssueTitle);
        let issue_text = required(IssueField::IssueText);
        let created_by = required(IssueField::CreatedBy);

        let mut optional = |field: IssueField| -> String {
            match fields.get(field.as_str()).map(|v| cast_text(field, v)) {
                Some(Ok(Some(text))) => text,
                Some(Err(err)) => {
                    errors.push(err);
                    String::new()
                }
                Some(Ok(None)) | None => String::new(),
            }
        };
        let assigned_to = optional(IssueField::AssignedTo);
        let status_text = optional(IssueField::StatusText);

        let open = match fields.get(IssueField::Open.as_str()) {
            Some(Value::Null) => {
                errors.push(ValidationError::new("open", "cannot be null"));
                true
            }
            Some(value) => match cast_bool(IssueField::Open, value) {
                Ok(open) => open.unwrap_or(true),
                Err(err) => {
                    errors.push(err);
                    true
                }
            },
            None => true,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewIssue {
            project: project.to_string(),
            issue_title,
            issue_text,
            created_by,
            assigned_to,
            status_text,
            open,
        })
    }

    /// Build an `IssuePatch` from submitted fields.
    ///
    /// `_id`, `project`, timestamps and unknown fields are ignored; `null`
    /// and empty values are treated as not sent.
    ///
    /// # Errors
    ///
    /// Returns every value that cannot be cast to its field's type.
    pub fn validate_patch(fields: &RawFields) -> Result<IssuePatch, Vec<ValidationError>> {
        let mut patch = IssuePatch::default();
        let mut errors = Vec::new();

        for (name, value) in fields {
            let Some(field) = IssueField::from_name(name).filter(|f| f.is_updatable()) else {
                continue;
            };

            let slot = match field {
                IssueField::IssueTitle => &mut patch.issue_title,
                IssueField::IssueText => &mut patch.issue_text,
                IssueField::CreatedBy => &mut patch.created_by,
                IssueField::AssignedTo => &mut patch.assigned_to,
                IssueField::StatusText => &mut patch.status_text,
                IssueField::Open => {
                    match cast_bool(field, value) {
                        Ok(open) => patch.open = open,
                        Err(err) => errors.push(err),
                    }
                    continue;
                }
                _ => continue,
            };
            match cast_text(field, value) {
                Ok(text) => *slot = text,
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(errors)
        }
    }

    /// Validate a full issue record before it is written.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any invariant is violated.
    pub fn validate(issue: &Issue) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !is_valid_id_format(&issue.id) {
            errors.push(ValidationError::new("_id", "invalid format"));
        }

        for (field, value) in [
            (IssueField::IssueTitle, &issue.issue_title),
            (IssueField::IssueText, &issue.issue_text),
            (IssueField::CreatedBy, &issue.created_by),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::new(field.as_str(), "cannot be empty"));
            }
        }

        if issue.updated_on < issue.created_on {
            errors.push(ValidationError::new(
                "updated_on",
                "cannot be before created_on",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

//! Route handlers for `/api/issues/{project}`.
//!
//! Each handler validates the request, runs one closure against the store
//! and maps the outcome to a response. Client mistakes never leave the
//! `200` range.

use super::AppState;
use super::body::FieldsBody;
use super::response::{Outcome, fatal};
use crate::error::{ErrorClass, IssueTrackerError};
use crate::storage::ListFilters;
use crate::validation::{extract_id, has_update_fields};
use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::response::{IntoResponse, Response};

/// `GET`: list a project's issues. Every query pair is an equality filter.
pub async fn list_issues(
    State(state): State<AppState>,
    Path(project): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let filters = ListFilters::from_pairs(query_pairs(query.as_deref()));

    let result = state
        .run({
            let project = project.clone();
            move |issues| issues.list_for_project(&project, &filters)
        })
        .await;

    match result {
        Ok(issues) => Json(issues).into_response(),
        Err(err) => store_failure(&project, "list", &err),
    }
}

/// `POST`: create an issue in the addressed project.
pub async fn create_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    FieldsBody(fields): FieldsBody,
) -> Response {
    let result = state
        .run({
            let project = project.clone();
            move |issues| issues.create(&project, &fields)
        })
        .await;

    match result {
        Ok(issue) => {
            tracing::info!(project = %project, id = %issue.id, outcome = "created", "Create request");
            Json(issue).into_response()
        }
        Err(err) if err.class() == ErrorClass::Validation => {
            tracing::info!(project = %project, error = %err, outcome = "required_fields_missing", "Create request");
            Outcome::RequiredFieldsMissing.into_response()
        }
        Err(err) => store_failure(&project, "create", &err),
    }
}

/// `PUT`: apply the body's fields to the issue named by `_id`.
pub async fn update_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    FieldsBody(fields): FieldsBody,
) -> Response {
    let Some(id) = extract_id(&fields) else {
        return respond(&project, Outcome::MissingId);
    };
    if !has_update_fields(&fields) {
        return respond(&project, Outcome::NoUpdateFields(id));
    }

    let result = state
        .run({
            let (id, project) = (id.clone(), project.clone());
            move |issues| {
                let existing = issues.find_by_id_in_project(&id, &project)?;
                issues.update(existing, &fields)
            }
        })
        .await;

    match result {
        Ok(_) => respond(&project, Outcome::Updated(id)),
        Err(err) if err.is_user_recoverable() => {
            tracing::debug!(error = %err, "Update rejected");
            respond(&project, Outcome::CouldNotUpdate(id))
        }
        Err(err) => store_failure(&project, "update", &err),
    }
}

/// `DELETE`: remove the issue named by `_id`.
pub async fn delete_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    FieldsBody(fields): FieldsBody,
) -> Response {
    let Some(id) = extract_id(&fields) else {
        return respond(&project, Outcome::MissingId);
    };

    let result = state
        .run({
            let (id, project) = (id.clone(), project.clone());
            move |issues| {
                let existing = issues.find_by_id_in_project(&id, &project)?;
                issues.remove(&existing)
            }
        })
        .await;

    match result {
        Ok(()) => respond(&project, Outcome::Deleted(id)),
        Err(err) if err.class() == ErrorClass::NotFound => {
            respond(&project, Outcome::CouldNotDelete(id))
        }
        Err(err) => store_failure(&project, "delete", &err),
    }
}

/// Split a raw query string into pairs. A malformed query filters nothing.
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .and_then(|raw| serde_urlencoded::from_str::<Vec<(String, String)>>(raw).ok())
        .unwrap_or_default()
}

fn respond(project: &str, outcome: Outcome) -> Response {
    tracing::info!(project, outcome = outcome.label(), "Issue request");
    outcome.into_response()
}

fn store_failure(project: &str, op: &str, err: &IssueTrackerError) -> Response {
    tracing::error!(project, op, error = %err, "Store failure");
    fatal()
}

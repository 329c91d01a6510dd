//! Response bodies.
//!
//! Every outcome a client can act on is a `200` with a small JSON object.
//! Only store failures produce a bare `500`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Status object returned by create/update/delete for anything but a
/// created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'static str>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Non-record outcomes of a mutating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    RequiredFieldsMissing,
    MissingId,
    NoUpdateFields(String),
    CouldNotUpdate(String),
    Updated(String),
    CouldNotDelete(String),
    Deleted(String),
}

impl Outcome {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RequiredFieldsMissing => "required_fields_missing",
            Self::MissingId => "missing_id",
            Self::NoUpdateFields(_) => "no_update_fields",
            Self::CouldNotUpdate(_) => "could_not_update",
            Self::Updated(_) => "updated",
            Self::CouldNotDelete(_) => "could_not_delete",
            Self::Deleted(_) => "deleted",
        }
    }

    #[must_use]
    pub fn body(&self) -> OutcomeBody {
        let (error, result, id) = match self {
            Self::RequiredFieldsMissing => (Some("required field(s) missing"), None, None),
            Self::MissingId => (Some("missing _id"), None, None),
            Self::NoUpdateFields(id) => (Some("no update field(s) sent"), None, Some(id)),
            Self::CouldNotUpdate(id) => (Some("could not update"), None, Some(id)),
            Self::Updated(id) => (None, Some("successfully updated"), Some(id)),
            Self::CouldNotDelete(id) => (Some("could not delete"), None, Some(id)),
            Self::Deleted(id) => (None, Some("successfully deleted"), Some(id)),
        };
        OutcomeBody {
            error,
            result,
            id: id.cloned(),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body())).into_response()
    }
}

/// The response for a store failure: `500` with an empty body.
#[must_use]
pub fn fatal() -> Response {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

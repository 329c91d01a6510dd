//! Request body extraction.
//!
//! Bodies arrive either form-encoded or as JSON. Both become the same
//! untyped [`RawFields`] map so validation only ever sees one shape.

use crate::model::RawFields;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header;
use serde_json::Value;
use std::convert::Infallible;

/// Field map taken from a form or JSON request body.
///
/// Never rejects: an absent, unreadable or unparseable body is an empty map.
#[derive(Debug, Clone, Default)]
pub struct FieldsBody(pub RawFields);

impl<S> FromRequest<S> for FieldsBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let Ok(bytes) = Bytes::from_request(req, state).await else {
            tracing::debug!("Unreadable request body treated as empty");
            return Ok(Self::default());
        };

        Ok(Self(parse_fields(&content_type, &bytes)))
    }
}

/// Decode `bytes` according to `content_type`.
///
/// Without a recognised content type, a body that looks like a JSON object
/// is read as JSON and anything else as a form.
#[must_use]
pub fn parse_fields(content_type: &str, bytes: &[u8]) -> RawFields {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return RawFields::new();
    }

    if content_type.starts_with("application/json") {
        return parse_json(bytes);
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return parse_form(bytes);
    }

    let looks_like_json = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    if looks_like_json {
        parse_json(bytes)
    } else {
        parse_form(bytes)
    }
}

fn parse_json(bytes: &[u8]) -> RawFields {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("JSON body is not an object; treated as empty");
            RawFields::new()
        }
        Err(err) => {
            tracing::debug!(error = %err, "Malformed JSON body treated as empty");
            RawFields::new()
        }
    }
}

/// Form pairs become string values. A repeated key keeps its last value.
fn parse_form(bytes: &[u8]) -> RawFields {
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes) {
        Ok(pairs) => pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
        Err(err) => {
            tracing::debug!(error = %err, "Malformed form body treated as empty");
            RawFields::new()
        }
    }
}

#![allow(dead_code)]

use issue_tracker::model::{Issue, RawFields};
use serde_json::{Value, json};

/// Only the required fields.
pub fn required_fields() -> Value {
    json!({
        "issue_title": "Fix error in posting data",
        "issue_text": "When we post data it has an error.",
        "created_by": "Joe"
    })
}

/// Every writable field.
pub fn all_fields() -> Value {
    json!({
        "issue_title": "Faux Issue Title",
        "issue_text": "Functional Test - Every field filled in",
        "created_by": "fCC",
        "assigned_to": "Chai and Mocha",
        "status_text": "In QA",
        "open": true
    })
}

pub fn fields(value: Value) -> RawFields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn issue_from_json(value: &Value) -> Issue {
    serde_json::from_value(value.clone()).expect("body deserializes as an Issue")
}

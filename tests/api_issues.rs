mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::fixtures::{all_fields, issue_from_json, required_fields};
use common::{
    create, db_path, drop_issues_table, get, issues_path, list_by_id, send_empty, send_form,
    send_json, test_app, test_app_on_disk,
};
use serde_json::{Value, json};

const UNKNOWN_ID: &str = "5871dda29faedc3491ff93bb";

// === Create ===

#[tokio::test]
async fn create_with_every_field() {
    let _log = common::test_log("create_with_every_field");
    let app = test_app();

    let response = send_json(&app, Method::POST, &issues_path("apitest"), &all_fields()).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = &response.json;
    assert_eq!(body["issue_title"], "Faux Issue Title");
    assert_eq!(body["assigned_to"], "Chai and Mocha");
    assert_eq!(body["status_text"], "In QA");
    assert_eq!(body["open"], true);
    assert_eq!(body["project"], "apitest");
    assert_eq!(body["_id"].as_str().map(str::len), Some(24));
}

#[tokio::test]
async fn create_with_required_fields_applies_defaults() {
    let _log = common::test_log("create_with_required_fields_applies_defaults");
    let app = test_app();

    let response =
        send_json(&app, Method::POST, &issues_path("apitest"), &required_fields()).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = &response.json;
    assert_eq!(body["assigned_to"], "");
    assert_eq!(body["status_text"], "");
    assert_eq!(body["open"], true);
    assert_eq!(body["created_on"], body["updated_on"]);

    let issue = issue_from_json(body);
    assert!(issue.created_on <= Utc::now());
    assert_eq!(issue.created_on, issue.updated_on);
}

#[tokio::test]
async fn create_serializes_timestamps_with_millis() {
    let _log = common::test_log("create_serializes_timestamps_with_millis");
    let app = test_app();

    let response =
        send_json(&app, Method::POST, &issues_path("apitest"), &required_fields()).await;
    let created_on = response.json["created_on"].as_str().unwrap();
    assert_eq!(created_on.len(), "2024-05-04T12:00:00.000Z".len());
    assert!(created_on.ends_with('Z'));
}

#[tokio::test]
async fn create_missing_required_field() {
    let _log = common::test_log("create_missing_required_field");
    let app = test_app();

    let bodies = [
        json!({ "issue_title": "", "issue_text": "t", "created_by": "c" }),
        json!({ "issue_text": "t", "created_by": "c" }),
        json!({ "issue_title": "x", "issue_text": "", "created_by": "c" }),
        json!({ "issue_title": "x", "issue_text": "t" }),
        json!({}),
    ];

    for body in bodies {
        let response = send_json(&app, Method::POST, &issues_path("apitest"), &body).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json, json!({ "error": "required field(s) missing" }));
    }

    let listed = get(&app, &issues_path("apitest")).await;
    assert_eq!(listed.json, json!([]));
}

#[tokio::test]
async fn create_keeps_whitespace_only_values() {
    let _log = common::test_log("create_keeps_whitespace_only_values");
    let app = test_app();

    let body = json!({
        "issue_title": "   ",
        "issue_text": "t",
        "created_by": "c",
        "assigned_to": "  "
    });
    let response = send_json(&app, Method::POST, &issues_path("apitest"), &body).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["issue_title"], "   ");
    assert_eq!(response.json["assigned_to"], "  ");

    let id = response.json["_id"].as_str().unwrap().to_string();
    let listed = list_by_id(&app, "apitest", &id).await;
    assert_eq!(listed[0]["issue_title"], "   ");
    assert_eq!(listed[0]["assigned_to"], "  ");
}

#[tokio::test]
async fn create_with_null_open_is_rejected() {
    let _log = common::test_log("create_with_null_open_is_rejected");
    let app = test_app();

    let mut body = required_fields();
    body["open"] = Value::Null;
    let response = send_json(&app, Method::POST, &issues_path("apitest"), &body).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "required field(s) missing" }));
}

#[tokio::test]
async fn create_with_bad_boolean_is_rejected() {
    let _log = common::test_log("create_with_bad_boolean_is_rejected");
    let app = test_app();

    let mut body = required_fields();
    body["open"] = json!("maybe");
    let response = send_json(&app, Method::POST, &issues_path("apitest"), &body).await;
    assert_eq!(response.json, json!({ "error": "required field(s) missing" }));
}

#[tokio::test]
async fn create_without_body() {
    let _log = common::test_log("create_without_body");
    let app = test_app();

    let response = send_empty(&app, Method::POST, &issues_path("apitest")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "required field(s) missing" }));
}

#[tokio::test]
async fn create_uses_path_project_over_body() {
    let _log = common::test_log("create_uses_path_project_over_body");
    let app = test_app();

    let mut body = required_fields();
    body["project"] = json!("elsewhere");
    let id = create(&app, "apitest", &body).await;

    assert_eq!(list_by_id(&app, "apitest", &id).await.len(), 1);
    assert!(list_by_id(&app, "elsewhere", &id).await.is_empty());
}

#[tokio::test]
async fn create_from_form_body() {
    let _log = common::test_log("create_from_form_body");
    let app = test_app();

    let response = send_form(
        &app,
        Method::POST,
        &issues_path("apitest"),
        "issue_title=Form+title&issue_text=From%20a%20form&created_by=Ann&open=false",
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["issue_title"], "Form title");
    assert_eq!(response.json["issue_text"], "From a form");
    assert_eq!(response.json["open"], false);
}

#[tokio::test]
async fn create_with_malformed_json_is_missing_fields() {
    let _log = common::test_log("create_with_malformed_json_is_missing_fields");
    let app = test_app();

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri(issues_path("apitest"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"issue_title\": "))
        .unwrap();
    let response = common::send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "required field(s) missing" }));
}

// === List ===

#[tokio::test]
async fn list_returns_array_without_project() {
    let _log = common::test_log("list_returns_array_without_project");
    let app = test_app();
    create(&app, "apitest", &all_fields()).await;

    let response = get(&app, &issues_path("apitest")).await;
    assert_eq!(response.status, StatusCode::OK);

    let issues = response.json.as_array().unwrap();
    assert_eq!(issues.len(), 1);
    let keys: Vec<&str> = issues[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for expected in [
        "_id",
        "issue_title",
        "issue_text",
        "created_by",
        "assigned_to",
        "status_text",
        "open",
        "created_on",
        "updated_on",
    ] {
        assert!(keys.contains(&expected), "missing {expected} in {keys:?}");
    }
    assert!(!keys.contains(&"project"));
}

#[tokio::test]
async fn list_unknown_project_is_empty() {
    let _log = common::test_log("list_unknown_project_is_empty");
    let app = test_app();

    let response = get(&app, &issues_path("nobody")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!([]));
}

#[tokio::test]
async fn list_by_id_after_create() {
    let _log = common::test_log("list_by_id_after_create");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;
    create(&app, "apitest", &all_fields()).await;

    let listed = list_by_id(&app, "apitest", &id).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["_id"], id.as_str());
}

#[tokio::test]
async fn list_by_unknown_or_malformed_id_is_empty() {
    let _log = common::test_log("list_by_unknown_or_malformed_id_is_empty");
    let app = test_app();
    create(&app, "apitest", &required_fields()).await;

    assert!(list_by_id(&app, "apitest", UNKNOWN_ID).await.is_empty());
    assert!(list_by_id(&app, "apitest", "1234").await.is_empty());
}

#[tokio::test]
async fn list_filters_on_fields() {
    let _log = common::test_log("list_filters_on_fields");
    let app = test_app();
    create(&app, "apitest", &required_fields()).await;
    let mut closed = all_fields();
    closed["open"] = json!(false);
    let closed_id = create(&app, "apitest", &closed).await;

    let open = get(&app, &format!("{}?open=true", issues_path("apitest"))).await;
    assert_eq!(open.json.as_array().unwrap().len(), 1);

    let response = get(
        &app,
        &format!(
            "{}?open=false&assigned_to=Chai%20and%20Mocha",
            issues_path("apitest")
        ),
    )
    .await;
    let issues = response.json.as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["_id"], closed_id.as_str());

    let none = get(
        &app,
        &format!("{}?open=true&assigned_to=Chai%20and%20Mocha", issues_path("apitest")),
    )
    .await;
    assert_eq!(none.json, json!([]));
}

#[tokio::test]
async fn list_with_unknown_filter_key_matches_nothing() {
    let _log = common::test_log("list_with_unknown_filter_key_matches_nothing");
    let app = test_app();
    create(&app, "apitest", &required_fields()).await;

    let response = get(&app, &format!("{}?priority=high", issues_path("apitest"))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!([]));
}

#[tokio::test]
async fn list_preserves_insertion_order() {
    let _log = common::test_log("list_preserves_insertion_order");
    let app = test_app();
    let mut ids = Vec::new();
    for n in 0..4 {
        let mut body = required_fields();
        body["issue_title"] = json!(format!("issue {n}"));
        ids.push(create(&app, "apitest", &body).await);
    }

    let response = get(&app, &issues_path("apitest")).await;
    let listed: Vec<&str> = response
        .json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["_id"].as_str())
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn projects_are_isolated() {
    let _log = common::test_log("projects_are_isolated");
    let app = test_app();
    let id = create(&app, "alpha", &required_fields()).await;
    create(&app, "beta", &required_fields()).await;

    let alpha = get(&app, &issues_path("alpha")).await;
    assert_eq!(alpha.json.as_array().unwrap().len(), 1);
    assert!(list_by_id(&app, "beta", &id).await.is_empty());

    let update = send_json(
        &app,
        Method::PUT,
        &issues_path("beta"),
        &json!({ "_id": id, "issue_title": "hijack" }),
    )
    .await;
    assert_eq!(update.json, json!({ "error": "could not update", "_id": id }));

    let delete = send_json(&app, Method::DELETE, &issues_path("beta"), &json!({ "_id": id })).await;
    assert_eq!(delete.json, json!({ "error": "could not delete", "_id": id }));
}

#[tokio::test]
async fn trailing_slash_is_the_same_endpoint() {
    let _log = common::test_log("trailing_slash_is_the_same_endpoint");
    let app = test_app();

    let created = send_json(&app, Method::POST, "/api/issues/apitest/", &required_fields()).await;
    assert_eq!(created.status, StatusCode::OK);

    let listed = get(&app, "/api/issues/apitest").await;
    assert_eq!(listed.json.as_array().unwrap().len(), 1);
    let listed = get(&app, "/api/issues/apitest/").await;
    assert_eq!(listed.json.as_array().unwrap().len(), 1);
}

// === Update ===

#[tokio::test]
async fn update_without_id() {
    let _log = common::test_log("update_without_id");
    let app = test_app();

    let response = send_empty(&app, Method::PUT, &issues_path("apitest")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "missing _id" }));

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "issue_title": "no id" }),
    )
    .await;
    assert_eq!(response.json, json!({ "error": "missing _id" }));
}

#[tokio::test]
async fn update_with_only_id() {
    let _log = common::test_log("update_with_only_id");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;

    let response = send_json(&app, Method::PUT, &issues_path("apitest"), &json!({ "_id": id })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json,
        json!({ "error": "no update field(s) sent", "_id": id })
    );

    let blank = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "issue_title": "", "project": "x" }),
    )
    .await;
    assert_eq!(
        blank.json,
        json!({ "error": "no update field(s) sent", "_id": id })
    );
}

#[tokio::test]
async fn update_with_whitespace_only_value() {
    let _log = common::test_log("update_with_whitespace_only_value");
    let app = test_app();
    let mut body = all_fields();
    body["status_text"] = json!("In QA");
    let id = create(&app, "apitest", &body).await;

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "status_text": " " }),
    )
    .await;
    assert_eq!(
        response.json,
        json!({ "result": "successfully updated", "_id": id })
    );

    let listed = list_by_id(&app, "apitest", &id).await;
    assert_eq!(listed[0]["status_text"], " ");
}

#[tokio::test]
async fn update_unknown_id() {
    let _log = common::test_log("update_unknown_id");
    let app = test_app();

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": UNKNOWN_ID, "issue_text": "New Issue Text" }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json,
        json!({ "error": "could not update", "_id": UNKNOWN_ID })
    );
}

#[tokio::test]
async fn update_malformed_id() {
    let _log = common::test_log("update_malformed_id");
    let app = test_app();

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": 1234, "issue_text": "x" }),
    )
    .await;
    assert_eq!(response.json, json!({ "error": "could not update", "_id": "1234" }));
}

#[tokio::test]
async fn update_with_invalid_value_leaves_record_unchanged() {
    let _log = common::test_log("update_with_invalid_value_leaves_record_unchanged");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;
    let before = list_by_id(&app, "apitest", &id).await;

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "open": 123 }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "could not update", "_id": id }));

    let after = list_by_id(&app, "apitest", &id).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_changes_fields_and_refreshes_updated_on() {
    let _log = common::test_log("update_changes_fields_and_refreshes_updated_on");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "issue_text": "New Issue Text", "open": false }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json,
        json!({ "result": "successfully updated", "_id": id })
    );

    let listed = list_by_id(&app, "apitest", &id).await;
    let issue = issue_from_json(&listed[0]);
    assert_eq!(issue.issue_text, "New Issue Text");
    assert!(!issue.open);
    assert_eq!(issue.issue_title, "Fix error in posting data");
    assert!(issue.updated_on > issue.created_on);
}

#[tokio::test]
async fn update_ignores_identity_fields() {
    let _log = common::test_log("update_ignores_identity_fields");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;
    let before = issue_from_json(&list_by_id(&app, "apitest", &id).await[0]);

    let response = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({
            "_id": id,
            "project": "elsewhere",
            "created_on": "2000-01-01T00:00:00.000Z",
            "status_text": "Triaged"
        }),
    )
    .await;
    assert_eq!(response.json["result"], "successfully updated");

    let after = issue_from_json(&list_by_id(&app, "apitest", &id).await[0]);
    assert_eq!(after.created_on, before.created_on);
    assert_eq!(after.status_text, "Triaged");
}

#[tokio::test]
async fn update_from_form_body() {
    let _log = common::test_log("update_from_form_body");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;

    let response = send_form(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &format!("_id={id}&open=false&assigned_to=Sam"),
    )
    .await;
    assert_eq!(
        response.json,
        json!({ "result": "successfully updated", "_id": id })
    );

    let issue = &list_by_id(&app, "apitest", &id).await[0];
    assert_eq!(issue["open"], false);
    assert_eq!(issue["assigned_to"], "Sam");
}

#[tokio::test]
async fn repeated_updates_keep_moving_updated_on() {
    let _log = common::test_log("repeated_updates_keep_moving_updated_on");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;

    let mut last = issue_from_json(&list_by_id(&app, "apitest", &id).await[0]).updated_on;
    for n in 0..3 {
        send_json(
            &app,
            Method::PUT,
            &issues_path("apitest"),
            &json!({ "_id": id, "status_text": format!("step {n}") }),
        )
        .await;
        let now = issue_from_json(&list_by_id(&app, "apitest", &id).await[0]).updated_on;
        assert!(now > last);
        last = now;
    }
}

// === Delete ===

#[tokio::test]
async fn delete_without_id() {
    let _log = common::test_log("delete_without_id");
    let app = test_app();

    let response = send_empty(&app, Method::DELETE, &issues_path("apitest")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "error": "missing _id" }));
}

#[tokio::test]
async fn delete_unknown_id() {
    let _log = common::test_log("delete_unknown_id");
    let app = test_app();

    let response = send_json(
        &app,
        Method::DELETE,
        &issues_path("apitest"),
        &json!({ "_id": UNKNOWN_ID }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json,
        json!({ "error": "could not delete", "_id": UNKNOWN_ID })
    );

    let malformed = send_json(
        &app,
        Method::DELETE,
        &issues_path("apitest"),
        &json!({ "_id": "not-an-id" }),
    )
    .await;
    assert_eq!(
        malformed.json,
        json!({ "error": "could not delete", "_id": "not-an-id" })
    );
}

#[tokio::test]
async fn delete_existing_issue() {
    let _log = common::test_log("delete_existing_issue");
    let app = test_app();
    let id = create(&app, "apitest", &required_fields()).await;

    let response = send_form(&app, Method::DELETE, &issues_path("apitest"), &format!("_id={id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json,
        json!({ "result": "successfully deleted", "_id": id })
    );

    assert!(list_by_id(&app, "apitest", &id).await.is_empty());

    let again = send_json(&app, Method::DELETE, &issues_path("apitest"), &json!({ "_id": id })).await;
    assert_eq!(again.json, json!({ "error": "could not delete", "_id": id }));
}

// === Lifecycle ===

#[tokio::test]
async fn end_to_end_lifecycle() {
    let _log = common::test_log("end_to_end_lifecycle");
    let app = test_app();

    let created = send_json(
        &app,
        Method::POST,
        &issues_path("apitest"),
        &json!({ "created_by": "a", "issue_text": "t", "issue_title": "x" }),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.json["created_by"], "a");
    assert_eq!(created.json["issue_text"], "t");
    assert_eq!(created.json["issue_title"], "x");
    assert_eq!(created.json["open"], true);
    let id = created.json["_id"].as_str().unwrap().to_string();

    let updated = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "issue_title": "y" }),
    )
    .await;
    assert_eq!(updated.json, json!({ "result": "successfully updated", "_id": id }));

    let listed = list_by_id(&app, "apitest", &id).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["issue_title"], "y");

    let deleted = send_json(&app, Method::DELETE, &issues_path("apitest"), &json!({ "_id": id })).await;
    assert_eq!(deleted.json, json!({ "result": "successfully deleted", "_id": id }));

    assert_eq!(list_by_id(&app, "apitest", &id).await, Vec::<Value>::new());
}

// === Store failures ===

#[tokio::test]
async fn store_failure_is_empty_500() {
    let _log = common::test_log("store_failure_is_empty_500");
    let (app, dir) = test_app_on_disk();
    let id = create(&app, "apitest", &required_fields()).await;

    drop_issues_table(&db_path(&dir));

    let list = get(&app, &issues_path("apitest")).await;
    assert_eq!(list.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(list.bytes.is_empty());

    let create = send_json(&app, Method::POST, &issues_path("apitest"), &required_fields()).await;
    assert_eq!(create.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(create.bytes.is_empty());

    let update = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": id, "issue_title": "z" }),
    )
    .await;
    assert_eq!(update.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(update.bytes.is_empty());

    let delete = send_json(&app, Method::DELETE, &issues_path("apitest"), &json!({ "_id": id })).await;
    assert_eq!(delete.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(delete.bytes.is_empty());
}

#[tokio::test]
async fn validation_paths_skip_the_store() {
    let _log = common::test_log("validation_paths_skip_the_store");
    let (app, dir) = test_app_on_disk();
    drop_issues_table(&db_path(&dir));

    let missing = send_empty(&app, Method::PUT, &issues_path("apitest")).await;
    assert_eq!(missing.status, StatusCode::OK);
    assert_eq!(missing.json, json!({ "error": "missing _id" }));

    let no_fields = send_json(
        &app,
        Method::PUT,
        &issues_path("apitest"),
        &json!({ "_id": UNKNOWN_ID }),
    )
    .await;
    assert_eq!(no_fields.status, StatusCode::OK);
}

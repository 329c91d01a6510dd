#![allow(dead_code)]

pub mod fixtures;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use issue_tracker::api::{AppState, router};
use issue_tracker::issues::IssueManager;
use issue_tracker::storage::SqliteStorage;
use serde_json::Value;
use std::path::Path;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        issue_tracker::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn test_db() -> SqliteStorage {
    init_test_logging();
    SqliteStorage::open_memory().expect("Failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStorage, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage =
        SqliteStorage::open(&db_path(&dir)).expect("Failed to create test database");
    (storage, dir)
}

pub fn db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("issues.db")
}

/// Router backed by a fresh in-memory store.
pub fn test_app() -> Router {
    app_with_storage(test_db())
}

pub fn app_with_storage(storage: SqliteStorage) -> Router {
    router(AppState::new(IssueManager::new(storage)))
}

/// Router backed by an on-disk store, for tests that tamper with the file.
pub fn test_app_on_disk() -> (Router, TempDir) {
    let (storage, dir) = test_db_with_dir();
    (app_with_storage(storage), dir)
}

pub fn drop_issues_table(path: &Path) {
    let conn = rusqlite::Connection::open(path).expect("open db for tampering");
    conn.execute_batch("DROP TABLE issues")
        .expect("drop issues table");
}

pub fn issues_path(project: &str) -> String {
    format!("/api/issues/{project}")
}

/// Status, raw body bytes, and the body parsed as JSON (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub bytes: Vec<u8>,
    pub json: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes()
        .to_vec();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    TestResponse {
        status,
        bytes,
        json,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

pub async fn send_json(app: &Router, method: Method, uri: &str, body: &Value) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

pub async fn send_form(app: &Router, method: Method, uri: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

pub async fn send_empty(app: &Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    send(app, request).await
}

/// POST a JSON body and return the created record's `_id`.
pub async fn create(app: &Router, project: &str, body: &Value) -> String {
    let response = send_json(app, Method::POST, &issues_path(project), body).await;
    assert_eq!(response.status, StatusCode::OK);
    response.json["_id"]
        .as_str()
        .unwrap_or_else(|| panic!("create returned no _id: {}", response.json))
        .to_string()
}

/// GET `?_id=<id>` and return the listed array.
pub async fn list_by_id(app: &Router, project: &str, id: &str) -> Vec<Value> {
    let response = get(app, &format!("{}?_id={id}", issues_path(project))).await;
    assert_eq!(response.status, StatusCode::OK);
    response
        .json
        .as_array()
        .cloned()
        .expect("list returns an array")
}

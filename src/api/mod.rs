//! HTTP surface: an axum router over `/api/issues/{project}`.

pub mod body;
pub mod handlers;
pub mod response;

use crate::error::{IssueTrackerError, Result};
use crate::issues::IssueManager;
use axum::Router;
use axum::routing::get;
use std::sync::{Arc, Mutex};

/// Shared handler state: the single store handle.
#[derive(Debug, Clone)]
pub struct AppState {
    issues: Arc<Mutex<IssueManager>>,
}

impl AppState {
    #[must_use]
    pub fn new(issues: IssueManager) -> Self {
        Self {
            issues: Arc::new(Mutex::new(issues)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    ///
    /// The lock is held for the whole closure, so a lookup and the write
    /// that follows it see the same record.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, `StorageUnavailable` if a previous
    /// holder panicked, or `Other` if the blocking task could not complete.
    pub async fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut IssueManager) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let issues = Arc::clone(&self.issues);
        tokio::task::spawn_blocking(move || {
            let mut guard = issues.lock().map_err(|_| {
                IssueTrackerError::StorageUnavailable("issue store lock poisoned".to_string())
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|err| IssueTrackerError::Other(anyhow::Error::new(err)))?
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let issues = get(handlers::list_issues)
        .post(handlers::create_issue)
        .put(handlers::update_issue)
        .delete(handlers::delete_issue);

    Router::new()
        .route("/api/issues/{project}", issues.clone())
        .route("/api/issues/{project}/", issues)
        .with_state(state)
}

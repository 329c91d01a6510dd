//! `issue_tracker`: a project-scoped issue tracker served over HTTP.
//!
//! Issues live in `SQLite` and are exposed under `/api/issues/{project}`
//! with list, create, update and delete verbs.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod issues;
pub mod logging;
pub mod model;
pub mod storage;
pub mod util;
pub mod validation;

pub use error::{ErrorClass, IssueTrackerError, Result, ValidationError};

//! `SQLite` storage layer for `issue_tracker`.
//!
//! One table of issue documents plus a ledger of allocated ids. All writes
//! go through [`SqliteStorage::mutate`] so each one runs in its own
//! immediate transaction.

pub mod schema;
pub mod sqlite;

pub use sqlite::{FieldFilter, ListFilters, SqliteStorage};

//! Shared utilities for `issue_tracker`.
//!
//! - ID generation (SHA256, hex)
//! - Timestamp parsing and formatting (RFC3339, millisecond precision)

pub mod id;
pub mod time;

pub use id::{IdGenerator, is_valid_id_format, normalize_id};
pub use time::{format_timestamp, next_update_time, now_millis, parse_timestamp};

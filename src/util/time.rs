//! Timestamp formatting and parsing utilities.
//!
//! Timestamps travel as RFC3339 UTC strings with millisecond precision
//! (`2024-05-04T12:00:00.000Z`) both on the wire and in storage, so every
//! value is truncated to whole milliseconds before it is persisted.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp the way it is stored and served.
#[must_use]
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a client- or store-provided timestamp.
///
/// Supports:
/// - RFC3339: `2024-05-04T12:00:00.000Z`, `2024-05-04T14:00:00+02:00`
/// - SQL style: `2024-05-04 12:00:00` (assumed UTC)
///
/// Returns `None` for anything else.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Current time truncated to whole milliseconds.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Drop sub-millisecond precision.
#[must_use]
pub fn truncate_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Timestamp for a modification of a record last touched at `previous`.
///
/// Always strictly later than `previous`, even when two writes land within
/// the same millisecond.
#[must_use]
pub fn next_update_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    let floor = previous + Duration::milliseconds(1);
    if now > previous { now } else { floor }
}

/// Serde adapter: serialize with [`format_timestamp`].
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize_timestamp<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(at))
}

/// Serde adapter: deserialize with [`parse_timestamp`].
///
/// # Errors
///
/// Returns an error if the value is not a string or not a recognized timestamp.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

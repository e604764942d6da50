// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp helpers for the ISO-8601 string form stored in SQLite.
//!
//! All persisted timestamps use `%Y-%m-%dT%H:%M:%S%.3fZ` (UTC,
//! millisecond precision), which compares correctly as text.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Current UTC time in the stored string form.
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

/// Render a UTC instant in the stored string form.
pub fn to_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time shifted by a signed number of seconds.
pub fn now_plus_secs(secs: i64) -> String {
    to_iso(Utc::now() + Duration::seconds(secs))
}

/// Current time shifted by a signed number of minutes.
pub fn now_plus_minutes(minutes: i64) -> String {
    to_iso(Utc::now() + Duration::minutes(minutes))
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

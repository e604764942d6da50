// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-attempt scheduling for ingested jobs.
//!
//! An explicit `scheduled_time` (with an optional timezone offset) wins;
//! otherwise the urgency level maps to a default delay. An unparseable
//! explicit time falls back to urgency-based scheduling rather than
//! rejecting the request.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use herald_core::time::to_iso;
use tracing::{debug, warn};

/// How soon the first call attempt should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Due immediately.
    Urgent,
    /// Due in one hour.
    High,
    /// Due in three hours.
    Medium,
    /// Due in twenty-four hours.
    Low,
}

impl FromStr for Urgency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(()),
        }
    }
}

impl Urgency {
    fn delay(self) -> Duration {
        match self {
            Self::Urgent => Duration::zero(),
            Self::High => Duration::hours(1),
            Self::Medium => Duration::hours(3),
            Self::Low => Duration::hours(24),
        }
    }
}

/// Compute the first-attempt due time as a stored ISO string.
pub fn resolve_next_retry_at(
    now: DateTime<Utc>,
    urgency: Urgency,
    scheduled_time: Option<&str>,
    timezone_offset_minutes: Option<i64>,
) -> String {
    if let Some(raw) = scheduled_time.map(str::trim).filter(|s| !s.is_empty()) {
        match parse_scheduled_time(raw, timezone_offset_minutes) {
            Some(at) => {
                debug!(%at, raw, "using explicit scheduled time");
                return to_iso(at);
            }
            None => {
                warn!(raw, "could not parse scheduled time, falling back to urgency");
            }
        }
    }
    to_iso(now + urgency.delay())
}

/// Parse a browser datetime-local or RFC 3339 string. The offset is the
/// JavaScript `getTimezoneOffset()` convention (minutes west of UTC), so
/// it is added to convert local wall time to UTC.
fn parse_scheduled_time(raw: &str, timezone_offset_minutes: Option<i64>) -> Option<DateTime<Utc>> {
    if let Ok(with_zone) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_zone.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            let adjusted = naive + Duration::minutes(timezone_offset_minutes.unwrap_or(0));
            return Some(Utc.from_utc_datetime(&adjusted));
        }
    }
    None
}

/// Compose the stored objective from the call purpose and extra notes.
pub fn build_objective(call_purpose: &str, notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("{call_purpose}\n\nAdditional information: {notes}"),
        None => call_purpose.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::time::parse_iso;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn urgency_levels_parse() {
        assert_eq!("urgent".parse::<Urgency>().unwrap(), Urgency::Urgent);
        assert_eq!("HIGH".parse::<Urgency>().unwrap(), Urgency::High);
        assert!("yesterday".parse::<Urgency>().is_err());
    }

    #[test]
    fn urgent_is_due_immediately() {
        let at = resolve_next_retry_at(now(), Urgency::Urgent, None, None);
        assert_eq!(parse_iso(&at).unwrap(), now());
    }

    #[test]
    fn urgency_maps_to_default_delays() {
        let high = resolve_next_retry_at(now(), Urgency::High, None, None);
        assert_eq!(parse_iso(&high).unwrap(), now() + Duration::hours(1));

        let medium = resolve_next_retry_at(now(), Urgency::Medium, None, None);
        assert_eq!(parse_iso(&medium).unwrap(), now() + Duration::hours(3));

        let low = resolve_next_retry_at(now(), Urgency::Low, None, None);
        assert_eq!(parse_iso(&low).unwrap(), now() + Duration::hours(24));
    }

    #[test]
    fn explicit_time_overrides_urgency() {
        let at = resolve_next_retry_at(
            now(),
            Urgency::Low,
            Some("2026-03-15T09:30"),
            None,
        );
        assert_eq!(
            parse_iso(&at).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn timezone_offset_shifts_local_time_to_utc() {
        // UTC-5: getTimezoneOffset() reports +300 minutes west.
        let at = resolve_next_retry_at(
            now(),
            Urgency::Low,
            Some("2026-03-15T09:30"),
            Some(300),
        );
        assert_eq!(
            parse_iso(&at).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn unparseable_time_falls_back_to_urgency() {
        let at = resolve_next_retry_at(now(), Urgency::Medium, Some("next tuesday-ish"), None);
        assert_eq!(parse_iso(&at).unwrap(), now() + Duration::hours(3));
    }

    #[test]
    fn notes_are_appended_to_the_objective() {
        assert_eq!(build_objective("Confirm the order", None), "Confirm the order");
        assert_eq!(
            build_objective("Confirm the order", Some("Ask for Maria at the desk")),
            "Confirm the order\n\nAdditional information: Ask for Maria at the desk"
        );
        assert_eq!(build_objective("Confirm the order", Some("  ")), "Confirm the order");
    }
}

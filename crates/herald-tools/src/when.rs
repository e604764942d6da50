// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar-aware resolution of natural-language date references.
//!
//! Turns phrases like "today", "yesterday", "3 days ago", "tuesday", or
//! "June 5" into a concrete half-open `[start, end)` UTC window,
//! optionally narrowed to a time-of-day band. "last call" / "most
//! recent" resolve to [`DateWindow::MostRecent`] instead of a window.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Time-of-day band applied to a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[default]
    Any,
    /// 06:00–12:00.
    Morning,
    /// 12:00–18:00.
    Afternoon,
    /// 18:00–24:00.
    Evening,
}

impl FromStr for TimeOfDay {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "" => Ok(Self::Any),
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            _ => Err(()),
        }
    }
}

/// Resolution result for a date reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateWindow {
    /// Half-open `[start, end)` window.
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// "Last call" / "most recent": no date filter, limit to one row.
    MostRecent,
}

/// Resolve a date reference against `now`. Returns `None` when the
/// reference cannot be parsed; callers ignore the date filter then.
pub fn resolve(now: DateTime<Utc>, date_reference: &str, band: TimeOfDay) -> Option<DateWindow> {
    let reference = date_reference.trim().to_lowercase();
    if reference.is_empty() {
        return None;
    }

    let today = now.date_naive();

    if matches!(reference.as_str(), "last call" | "most recent" | "latest") {
        return Some(DateWindow::MostRecent);
    }

    let target = if reference == "today" {
        Some(today)
    } else if reference == "yesterday" {
        today.pred_opt()
    } else if reference.ends_with("days ago") || reference.ends_with("days back") {
        reference
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<i64>().ok())
            .and_then(|n| today.checked_sub_signed(Duration::days(n)))
    } else if let Some(date) = parse_weekday(&reference, today) {
        Some(date)
    } else {
        parse_explicit_date(&reference, today)
    };

    target.map(|date| banded_window(date, band))
}

/// Most recent occurrence of a named weekday, on or before today.
/// Accepts an optional "last " or "on " prefix.
fn parse_weekday(reference: &str, today: NaiveDate) -> Option<NaiveDate> {
    let name = reference
        .strip_prefix("last ")
        .or_else(|| reference.strip_prefix("on "))
        .unwrap_or(reference);
    let target = match name {
        "monday" => 0,
        "tuesday" => 1,
        "wednesday" => 2,
        "thursday" => 3,
        "friday" => 4,
        "saturday" => 5,
        "sunday" => 6,
        _ => return None,
    };
    let delta = (today.weekday().num_days_from_monday() as i64 + 7 - target) % 7;
    today.checked_sub_signed(Duration::days(delta))
}

/// Explicit calendar dates: ISO form, or day/month-name forms with the
/// current year assumed when none is given.
fn parse_explicit_date(reference: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(reference, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%d %B %Y", "%B %d %Y", "%d %b %Y", "%b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(reference, format) {
            return Some(date);
        }
    }
    // Year-less forms: assume the current year.
    let with_year = format!("{reference} {}", today.year());
    for format in ["%d %B %Y", "%B %d %Y", "%d %b %Y", "%b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            return Some(date);
        }
    }
    None
}

/// The `[start, end)` window for a date under a time-of-day band.
fn banded_window(date: NaiveDate, band: TimeOfDay) -> DateWindow {
    let midnight = date.and_time(NaiveTime::MIN);
    let (from_hour, to_hour) = match band {
        TimeOfDay::Any => (0, 24),
        TimeOfDay::Morning => (6, 12),
        TimeOfDay::Afternoon => (12, 18),
        TimeOfDay::Evening => (18, 24),
    };
    DateWindow::Window {
        start: Utc.from_utc_datetime(&(midnight + Duration::hours(from_hour))),
        end: Utc.from_utc_datetime(&(midnight + Duration::hours(to_hour))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // A Tuesday.
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap()
    }

    fn window(result: Option<DateWindow>) -> (DateTime<Utc>, DateTime<Utc>) {
        match result {
            Some(DateWindow::Window { start, end }) => (start, end),
            other => panic!("expected a window, got {other:?}"),
        }
    }

    #[test]
    fn today_spans_the_whole_day() {
        let (start, end) = window(resolve(now(), "today", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn yesterday_shifts_one_day_back() {
        let (start, _end) = window(resolve(now(), "Yesterday", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn n_days_ago_is_counted() {
        let (start, _end) = window(resolve(now(), "3 days ago", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap());

        let (start, _end) = window(resolve(now(), "5 days back", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn morning_band_narrows_the_window() {
        let (start, end) = window(resolve(now(), "today", TimeOfDay::Morning));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn evening_band_ends_at_midnight() {
        let (start, end) = window(resolve(now(), "today", TimeOfDay::Evening));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn most_recent_has_no_window() {
        assert_eq!(
            resolve(now(), "last call", TimeOfDay::Any),
            Some(DateWindow::MostRecent)
        );
        assert_eq!(
            resolve(now(), "most recent", TimeOfDay::Any),
            Some(DateWindow::MostRecent)
        );
    }

    #[test]
    fn weekday_resolves_to_most_recent_occurrence() {
        // 2026-03-10 is a Tuesday; "monday" is the day before.
        let (start, _end) = window(resolve(now(), "monday", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());

        // "tuesday" is today, not a week ago.
        let (start, _end) = window(resolve(now(), "tuesday", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());

        // "wednesday" wraps to last week.
        let (start, _end) = window(resolve(now(), "last wednesday", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn explicit_dates_parse_with_and_without_year() {
        let (start, _end) = window(resolve(now(), "2026-02-14", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap());

        let (start, _end) = window(resolve(now(), "march 5", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());

        let (start, _end) = window(resolve(now(), "5 march", TimeOfDay::Any));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_yields_none() {
        assert!(resolve(now(), "whenever you feel like it", TimeOfDay::Any).is_none());
        assert!(resolve(now(), "", TimeOfDay::Any).is_none());
    }

    #[test]
    fn time_of_day_parses_known_bands() {
        assert_eq!("morning".parse::<TimeOfDay>().unwrap(), TimeOfDay::Morning);
        assert_eq!("ANY".parse::<TimeOfDay>().unwrap(), TimeOfDay::Any);
        assert!("midnightish".parse::<TimeOfDay>().is_err());
    }
}

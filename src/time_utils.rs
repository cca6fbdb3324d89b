// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Largest UTC offset in use (UTC+14:00).
pub const MAX_TZ_OFFSET_MINUTES: i32 = 14 * 60;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `[start, end)` in epoch milliseconds covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Local day for `date` at `tz_offset_minutes` east of UTC.
///
/// Without a date, the day containing `now` in that offset is used.
/// Returns `None` for an out-of-range offset.
pub fn day_window(
    date: Option<NaiveDate>,
    tz_offset_minutes: i32,
    now: DateTime<Utc>,
) -> Option<DayWindow> {
    if tz_offset_minutes.abs() > MAX_TZ_OFFSET_MINUTES {
        return None;
    }
    let offset = FixedOffset::east_opt(tz_offset_minutes * 60)?;
    let date = date.unwrap_or_else(|| now.with_timezone(&offset).date_naive());

    let start = offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()?;
    let end = start + Duration::days(1);

    Some(DayWindow {
        date,
        start_ms: start.timestamp_millis(),
        end_ms: end.timestamp_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn formats_with_z_suffix() {
        assert_eq!(
            format_utc_rfc3339(utc("2024-05-01T12:30:00+00:00")),
            "2024-05-01T12:30:00Z"
        );
    }

    #[test]
    fn utc_day_window() {
        let w = day_window(None, 0, utc("2024-05-01T23:59:00Z")).unwrap();
        assert_eq!(w.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(w.start_ms, utc("2024-05-01T00:00:00Z").timestamp_millis());
        assert_eq!(w.end_ms - w.start_ms, 86_400_000);
    }

    #[test]
    fn offset_moves_today_across_midnight() {
        // 23:30 UTC is already the next day at UTC+08:00.
        let w = day_window(None, 480, utc("2024-05-01T23:30:00Z")).unwrap();
        assert_eq!(w.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(w.start_ms, utc("2024-05-01T16:00:00Z").timestamp_millis());
    }

    #[test]
    fn explicit_date_with_negative_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let w = day_window(date, -300, utc("2030-01-01T00:00:00Z")).unwrap();
        assert_eq!(w.start_ms, utc("2024-01-15T05:00:00Z").timestamp_millis());
        assert_eq!(w.end_ms, utc("2024-01-16T05:00:00Z").timestamp_millis());
    }

    #[test]
    fn rejects_impossible_offset() {
        assert!(day_window(None, 15 * 60, Utc::now()).is_none());
    }
}

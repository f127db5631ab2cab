//! Calendar math for expiry matching and the daily sweep schedule.
//!
//! Validity timestamps are stored as unix seconds. Expiry questions are
//! asked about whole UTC calendar days, so a day is represented as the
//! half-open second range covering it; any stored time-of-day on that day
//! falls inside the range.

use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime};

#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    #[error("invalid time of day '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),
}

/// Half-open `[start, end)` unix-second range covering one UTC calendar day.
pub fn utc_day_bounds(day: NaiveDate) -> (i64, i64) {
    let start = day.and_time(NaiveTime::MIN).and_utc().timestamp();
    let end = day.checked_add_days(Days::new(1)).map_or(i64::MAX, |next| {
        next.and_time(NaiveTime::MIN).and_utc().timestamp()
    });
    (start, end)
}

/// Format a unix-second timestamp as its `YYYY-MM-DD` UTC day.
pub fn format_day(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map_or_else(|| "invalid-date".to_string(), |dt| dt.date_naive().to_string())
}

/// Parse a `HH:MM` wall-clock time.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, TimeError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| TimeError::InvalidTimeOfDay(s.to_string()))
}

/// Duration until the next local occurrence of the given wall-clock time.
///
/// If the time already passed today, targets tomorrow. A DST transition can
/// skew a single firing by the offset change, which is acceptable for a
/// daily sweep.
pub fn until_next_local(at: NaiveTime) -> Duration {
    let now = Local::now().naive_local();
    let mut next = now.date().and_time(at);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

//! Timestamp decomposition
//!
//! `ts` is milliseconds since the Unix epoch. The calendar attributes are
//! read off the wall clock at a fixed offset from UTC. Weeks follow
//! ISO-8601 and weekdays count from Monday = 0.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

/// Calendar attributes of one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    /// Wall-clock time as naive epoch millis
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

/// Decompose epoch millis, or say why they cannot be decoded
pub fn decompose_ts(ts: i64, offset: &FixedOffset) -> Result<CalendarParts, &'static str> {
    if ts < 0 {
        return Err("negative epoch millis");
    }

    let utc = DateTime::from_timestamp_millis(ts).ok_or("outside the representable range")?;
    let local = utc.with_timezone(offset).naive_local();

    Ok(CalendarParts {
        start_time: local.and_utc().timestamp_millis(),
        hour: local.hour() as i32,
        day: local.day() as i32,
        week: local.iso_week().week() as i32,
        month: local.month() as i32,
        year: local.year(),
        weekday: local.weekday().num_days_from_monday() as i32,
    })
}

use std::fmt;
use std::str::FromStr;

use crate::error::DateError;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Calendar day in "YYYY-MM-DD" form, interpreted in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(Date);

impl Day {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, DateError> {
        let month = time::Month::try_from(month).map_err(|e| DateError(e.to_string()))?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|e| DateError(e.to_string()))
    }

    /// 00:00:00 UTC of this day.
    pub fn start_timestamp(self) -> i64 {
        PrimitiveDateTime::new(self.0, time!(0:00)).assume_utc().unix_timestamp()
    }

    /// 23:59:00 UTC of this day (the last minute, as the range convention goes).
    pub fn end_timestamp(self) -> i64 {
        PrimitiveDateTime::new(self.0, time!(23:59)).assume_utc().unix_timestamp()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt = format_description!("[year]-[month]-[day]");
        match self.0.format(&fmt) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for Day {
    type Err = DateError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let b = s.as_bytes();
        let shape_ok = b.len() == 10
            && b[4] == b'-'
            && b[7] == b'-'
            && b.iter().enumerate().all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
        if !shape_ok {
            return Err(DateError(format!("expected YYYY-MM-DD, got {:?}", s)));
        }
        let fmt = format_description!("[year]-[month]-[day]");
        Date::parse(s, &fmt)
            .map(Self)
            .map_err(|e| DateError(format!("invalid date {:?}: {}", s, e)))
    }
}

/// A bounded span of epoch seconds. Fetching covers `(start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "window start must not be after its end");
        Self { start, end }
    }

    /// The whole-day range `[start 00:00, end 23:59]`.
    pub fn from_days(start: Day, end: Day) -> Result<Self, DateError> {
        if end < start {
            return Err(DateError(format!("end date {} is before start date {}", end, start)));
        }
        Ok(Self { start: start.start_timestamp(), end: end.end_timestamp() })
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", format_datetime(self.start), format_datetime(self.end))
    }
}

fn utc(ts: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// "YYYY-MM-DD" of an epoch timestamp, used for corpus-mode directory names.
pub fn format_day(ts: i64) -> String {
    Day(utc(ts).date()).to_string()
}

/// "YYYY-MM-DD HH:MM:SS" of an epoch timestamp, for logs.
pub fn format_datetime(ts: i64) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    utc(ts).format(&fmt).unwrap_or_else(|_| ts.to_string())
}

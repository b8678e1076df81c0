//! Calendar conventions for day bucketing.
//!
//! Every operation that turns an instant into a calendar day takes an explicit
//! [`DayBoundary`]. There is no ambient timezone: the server reads the offset
//! from configuration and passes it down, and tests pin it directly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::AggregationError;

/// A fixed UTC offset that defines where each calendar day starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid UTC offset '{0}', expected 'Z', 'UTC' or '+HH:MM'")]
pub struct ParseDayBoundaryError(String);

impl DayBoundary {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Offset east of UTC in seconds. `None` if out of range (±24h).
    pub fn east(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self::from_offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day `instant` falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// The instant at which `date` begins.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// Start of the calendar month containing `instant`.
    pub fn start_of_month(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let day = self.day_of(instant);
        self.start_of_day(day.with_day(1).unwrap_or(day))
    }

    /// Start of January 1 of the year containing `instant`.
    pub fn start_of_year(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let day = self.day_of(instant);
        self.start_of_day(NaiveDate::from_yo_opt(day.year(), 1).unwrap_or(day))
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset)
    }
}

impl FromStr for DayBoundary {
    type Err = ParseDayBoundaryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }

        let err = || ParseDayBoundaryError(raw.to_string());

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(err()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(err)?;
        let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(hours) || !is_digits(minutes) {
            return Err(err());
        }
        let hours: i32 = hours.parse().map_err(|_| err())?;
        let minutes: i32 = minutes.parse().map_err(|_| err())?;
        if !(0..60).contains(&minutes) {
            return Err(err());
        }

        Self::east(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
    }
}

/// Look-back selector for the analytics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    /// Start of today's calendar day to now.
    Day,
    /// The last 7 days (a rolling window, not a calendar week).
    Week,
    /// Start of the current calendar month to now.
    Month,
    /// January 1 of the current year to now.
    Year,
    /// Everything up to now.
    AllTime,
}

impl TimeRange {
    /// Parse an optional selector; absent or blank means all-time.
    pub fn from_selector(selector: Option<&str>) -> Result<Self, AggregationError> {
        match selector.map(str::trim) {
            None | Some("") => Ok(TimeRange::AllTime),
            Some(raw) => raw.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
            TimeRange::AllTime => "all",
        }
    }

    /// Resolve this range against `now` under the given day boundary.
    pub fn window(&self, now: DateTime<Utc>, boundary: DayBoundary) -> Window {
        let start = match self {
            TimeRange::Day => Some(boundary.start_of_day(boundary.day_of(now))),
            TimeRange::Week => Some(now - Duration::days(7)),
            TimeRange::Month => Some(boundary.start_of_month(now)),
            TimeRange::Year => Some(boundary.start_of_year(now)),
            TimeRange::AllTime => None,
        };
        Window { start, end: now }
    }
}

impl FromStr for TimeRange {
    type Err = AggregationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "day" => Ok(TimeRange::Day),
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::AllTime),
            other => Err(AggregationError::InvalidArgument(format!(
                "unsupported time range '{other}', expected one of day, week, month, year, all"
            ))),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A closed interval `[start, end]`; `start == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant <= self.end && self.start.is_none_or(|start| instant >= start)
    }
}

//! crates/bookmaker_core/src/date.rs
//!
//! Local calendar dates and the bucket keys derived from them.
//!
//! Every date the engine reasons about is a plain calendar date in the reference
//! time zone (UTC+09:00). Date-only strings (`YYYY-MM-DD`) are taken as-is; full
//! instants are shifted into the reference offset before their date is read. Day
//! arithmetic is whole calendar days, never 24h multiples.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Offset of the reference time zone, in seconds east of UTC.
pub const REFERENCE_OFFSET_SECONDS: i32 = 9 * 3600;

/// The fixed offset applied to every instant before it is bucketed.
pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid calendar date: '{0}'")]
pub struct DateParseError(pub String);

//=========================================================================================
// CalendarDate
//=========================================================================================

/// A date with no time-of-day, as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses `YYYY-MM-DD`, or an RFC 3339 instant written by older clients.
    pub fn parse(raw: &str) -> Result<Self, DateParseError> {
        let trimmed = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self(date));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|instant| Self::from_instant(instant.with_timezone(&Utc)))
            .map_err(|_| DateParseError(raw.to_string()))
    }

    /// The calendar date an instant falls on in the reference time zone.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&reference_offset()).date_naive())
    }

    /// "Today" for an evaluation pass that started at `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        Self::from_instant(now)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_first_of_month(&self) -> bool {
        self.day() == 1
    }

    pub fn is_last_of_month(&self) -> bool {
        self.0
            .succ_opt()
            .map_or(true, |next| next.month() != self.month())
    }

    /// Whole calendar days from `self` to `later` (negative if `later` is earlier).
    pub fn days_until(&self, later: CalendarDate) -> i64 {
        (later.0 - self.0).num_days()
    }

    pub fn next_day(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn prev_day(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year(),
            month: self.month(),
        }
    }

    pub fn iso_week(&self) -> IsoWeek {
        let week = self.0.iso_week();
        IsoWeek {
            year: week.year(),
            week: week.week(),
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for optional date fields, where an empty string means "not set".
pub mod optional {
    use super::CalendarDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<CalendarDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(date),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CalendarDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => CalendarDate::parse(text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

//=========================================================================================
// Bucket Keys
//=========================================================================================

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn first_day(&self) -> Option<CalendarDate> {
        CalendarDate::from_ymd(self.year, self.month, 1)
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> Vec<CalendarDate> {
        let mut out = Vec::with_capacity(31);
        let mut cursor = self.first_day();
        while let Some(day) = cursor.filter(|d| d.year_month() == *self) {
            out.push(day);
            cursor = day.next_day();
        }
        out
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        date.year_month() == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An ISO 8601 week (Monday start, numbered by the year of its Thursday),
/// displayed as `YYYY-Www`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn parses_date_only_strings() {
        let date = d("2024-03-09");
        assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 9));
        assert_eq!(date.to_string(), "2024-03-09");
        assert!(CalendarDate::parse("2024-13-01").is_err());
        assert!(CalendarDate::parse("").is_err());
    }

    #[test]
    fn instants_are_read_in_reference_offset() {
        // 20:00 UTC is already the next morning at UTC+9.
        assert_eq!(d("2024-01-01T20:00:00Z"), d("2024-01-02"));
        assert_eq!(d("2024-01-01T10:00:00Z"), d("2024-01-01"));

        let now = Utc.with_ymd_and_hms(2024, 6, 30, 15, 30, 0).unwrap();
        assert_eq!(CalendarDate::today(now), d("2024-07-01"));
    }

    #[test]
    fn day_subtraction_is_calendar_based() {
        assert_eq!(d("2024-01-01").days_until(d("2024-01-10")), 9);
        assert_eq!(d("2024-03-30").days_until(d("2024-04-02")), 3);
        assert_eq!(d("2024-01-10").days_until(d("2024-01-01")), -9);
        assert_eq!(d("2023-12-31").next_day(), Some(d("2024-01-01")));
    }

    #[test]
    fn month_edges() {
        assert!(d("2024-02-29").is_last_of_month());
        assert!(!d("2023-02-28").is_first_of_month());
        assert!(d("2023-02-28").is_last_of_month());
        assert!(d("2024-05-01").is_first_of_month());

        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next().to_string(), "2024-01");
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(YearMonth::new(2024, 2).unwrap().days().len(), 29);
        assert_eq!(dec.days().last(), Some(&d("2023-12-31")));
        assert!(YearMonth::new(2024, 0).is_none());
    }

    #[test]
    fn iso_week_keys_follow_thursday_rule() {
        // Sunday 2021-01-03 still belongs to the last week of 2020.
        assert_eq!(d("2021-01-03").iso_week().to_string(), "2020-W53");
        assert_eq!(d("2021-01-04").iso_week().to_string(), "2021-W01");
        // Monday 2024-12-30 already belongs to 2025.
        assert_eq!(d("2024-12-30").iso_week().to_string(), "2025-W01");
    }

    #[test]
    fn weekend_and_weekday() {
        assert_eq!(d("2024-06-01").weekday(), Weekday::Sat);
        assert!(d("2024-06-02").is_weekend());
        assert!(!d("2024-06-03").is_weekend());
    }
}

//! Calendar date handling.
//!
//! Birth dates are plain calendar dates. They arrive as ISO strings, either a
//! bare `YYYY-MM-DD` or a full RFC 3339 timestamp, and are normalized to the
//! UTC calendar date.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Parses an ISO date or RFC 3339 timestamp into a UTC calendar date.
///
/// # Errors
///
/// Returns `ValidationError::InvalidDate` if the input is neither form.
///
/// # Examples
///
/// ```
/// use tallyboard::time::parse_date;
///
/// let d = parse_date("2022-06-12").unwrap();
/// assert_eq!(d, parse_date("2022-06-12T23:10:00Z").unwrap());
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| ValidationError::InvalidDate {
            input: input.to_string(),
        })
}

/// Serde adapter for `NaiveDate` fields that accept both ISO forms.
pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// January 1st of `year`, clamped into chrono's representable range.
#[must_use]
pub fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(if year < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// An inclusive range of calendar dates: `[from, to]`.
///
/// This is the dashboard's date filter. Both ends are included, so a range
/// whose ends are equal selects a single day.
///
/// # Examples
///
/// ```
/// use tallyboard::DateRange;
/// use chrono::NaiveDate;
///
/// let from = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
/// let to = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
/// let range = DateRange::new(from, to).unwrap();
/// assert!(range.contains(to));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First included date.
    pub from: NaiveDate,

    /// Last included date.
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range from two dates.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidDateRange` if `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Creates a single-day range.
    #[must_use]
    pub const fn day(at: NaiveDate) -> Self {
        Self { from: at, to: at }
    }

    /// Smallest range covering every date in `dates`, or `None` if empty.
    pub fn covering<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(Self::day(d)),
            Some(r) => Some(Self {
                from: r.from.min(d),
                to: r.to.max(d),
            }),
        })
    }

    /// Check if a date falls within `[from, to]`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Number of calendar years touched by the range.
    #[must_use]
    pub fn span_years(&self) -> i32 {
        self.to.year() - self.from.year() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} → {}]", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_plain() {
        assert_eq!(parse_date("1987-03-04").unwrap(), d(1987, 3, 4));
        assert_eq!(parse_date("  1987-03-04 ").unwrap(), d(1987, 3, 4));
    }

    #[test]
    fn test_parse_date_timestamp_uses_utc_day() {
        assert_eq!(parse_date("2022-06-12T00:30:00+02:00").unwrap(), d(2022, 6, 11));
        assert_eq!(parse_date("2022-06-12T10:00:00Z").unwrap(), d(2022, 6, 12));
    }

    #[test]
    fn test_parse_date_invalid() {
        let err = parse_date("12/06/2022").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_date_range_new_invalid() {
        assert!(DateRange::new(d(2000, 1, 2), d(2000, 1, 1)).is_err());
        assert!(DateRange::new(d(2000, 1, 1), d(2000, 1, 1)).is_ok());
    }

    #[test]
    fn test_date_range_contains_is_inclusive() {
        let range = DateRange::new(d(2000, 1, 1), d(2000, 12, 31)).unwrap();
        assert!(range.contains(d(2000, 1, 1)));
        assert!(range.contains(d(2000, 12, 31)));
        assert!(!range.contains(d(2001, 1, 1)));
        assert!(!range.contains(d(1999, 12, 31)));
    }

    #[test]
    fn test_date_range_covering() {
        assert!(DateRange::covering(Vec::new()).is_none());
        let range = DateRange::covering(vec![d(1990, 5, 1), d(1970, 1, 2), d(2001, 3, 3)]).unwrap();
        assert_eq!(range.from, d(1970, 1, 2));
        assert_eq!(range.to, d(2001, 3, 3));
        assert_eq!(range.span_years(), 32);
    }

    #[test]
    fn test_year_start() {
        assert_eq!(year_start(1990), d(1990, 1, 1));
    }

    #[test]
    fn test_date_range_serialization() {
        let range = DateRange::new(d(1990, 1, 1), d(1991, 1, 1)).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert!(json.contains("1990-01-01"));
        let back: DateRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }
}

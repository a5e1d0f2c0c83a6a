//! Date normalization for order dates and range bounds.
//!
//! Every value is reduced to a calendar date. Datetime inputs lose their
//! time of day, so a range ending on a given day includes all of that day.

use crate::table::FieldValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a textual date in any of the accepted forms.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use sales_summary::dates::parse_date_str;
///
/// let expected = NaiveDate::from_ymd_opt(2013, 6, 1);
/// assert_eq!(parse_date_str("2013-06-01"), expected);
/// assert_eq!(parse_date_str("06/01/2013"), expected);
/// assert_eq!(parse_date_str("2013-06-01T17:45:00"), expected);
/// assert_eq!(parse_date_str("not-a-date"), None);
/// ```
pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    // Offsets are dropped; the local calendar date is what the order was booked on.
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .ok()
}

/// Normalize a cell to a calendar date.
///
/// Returns `Ok(None)` for `Null`, which no date range can contain.
/// Any other value that is not a recognizable date is an error carrying the
/// offending text.
pub fn parse_date(value: &FieldValue) -> Result<Option<NaiveDate>, String> {
    match value {
        FieldValue::Null => Ok(None),
        FieldValue::Date(d) => Ok(Some(*d)),
        FieldValue::String(s) => parse_date_str(s).map(Some).ok_or_else(|| s.clone()),
        FieldValue::Int(i) => NaiveDate::parse_from_str(&i.to_string(), "%Y%m%d")
            .map(Some)
            .map_err(|_| i.to_string()),
        other => Err(other.to_string()),
    }
}

/// Inclusive range bound given either as a date or as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateBound(NaiveDate);

impl DateBound {
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateBound {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for DateBound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date_str(s)
            .map(Self)
            .ok_or_else(|| format!("Unrecognized date: '{}'", s))
    }
}

impl TryFrom<String> for DateBound {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateBound> for String {
    fn from(bound: DateBound) -> Self {
        bound.to_string()
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

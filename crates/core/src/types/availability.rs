//! Doctor availability: working-hours range and human-readable summary.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TimeRange`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    /// The input is not two times separated by `-`.
    #[error("time range must look like HH:MM-HH:MM")]
    Malformed,
    /// One side of the range is not a valid `HH:MM` time.
    #[error("\"{0}\" is not a valid HH:MM time")]
    InvalidTime(String),
    /// The range is empty or runs backwards.
    #[error("start time must be before end time")]
    NotIncreasing,
}

/// A daily availability window such as `09:00-17:00`.
///
/// The start must be strictly before the end; overnight ranges are not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    /// Parse a range in `HH:MM-HH:MM` form.
    ///
    /// # Errors
    ///
    /// Returns [`AvailabilityError`] if the input is malformed or the start is
    /// not before the end.
    pub fn parse(s: &str) -> Result<Self, AvailabilityError> {
        let (start, end) = s.trim().split_once('-').ok_or(AvailabilityError::Malformed)?;
        let start = parse_hh_mm(start)?;
        let end = parse_hh_mm(end)?;

        if start >= end {
            return Err(AvailabilityError::NotIncreasing);
        }

        Ok(Self { start, end })
    }

    /// Start of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// End of the window.
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }
}

fn parse_hh_mm(s: &str) -> Result<NaiveTime, AvailabilityError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| AvailabilityError::InvalidTime(s.to_owned()))
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl FromStr for TimeRange {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = AvailabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

/// Build the human-readable availability line shown on a doctor's profile.
///
/// `days` is the stored free-text day list; comma-separated entries are
/// re-joined with `", "`.
///
/// ```
/// use clinic_core::{TimeRange, availability_summary};
///
/// let range = TimeRange::parse("09:00-17:00").unwrap();
/// assert_eq!(
///     availability_summary(Some("Monday,Wednesday"), Some(&range)),
///     "Available on: Monday, Wednesday from 09:00 - 17:00",
/// );
/// assert_eq!(availability_summary(None, Some(&range)), "No availability set.");
/// ```
#[must_use]
pub fn availability_summary(days: Option<&str>, range: Option<&TimeRange>) -> String {
    let days: Vec<&str> = days
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();

    match range {
        Some(range) if !days.is_empty() => format!(
            "Available on: {} from {} - {}",
            days.join(", "),
            range.start.format("%H:%M"),
            range.end.format("%H:%M"),
        ),
        _ => "No availability set.".to_owned(),
    }
}

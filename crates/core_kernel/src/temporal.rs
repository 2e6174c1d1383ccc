//! Calendar types
//!
//! - `ActivityDate`: the year/month/day an activity took place, validated
//!   against the real month length (leap years included)
//! - `Timezone`: the office timezone used for local dates and timestamps

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Returns the number of days in the given month, or `None` for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// The date an activity took place
///
/// Deserialization goes through [`ActivityDate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "DateParts")]
pub struct ActivityDate {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Deserialize)]
struct DateParts {
    year: i32,
    month: u32,
    day: u32,
}

impl TryFrom<DateParts> for ActivityDate {
    type Error = CoreError;

    fn try_from(parts: DateParts) -> Result<Self, Self::Error> {
        Self::new(parts.year, parts.month, parts.day)
    }
}

impl ActivityDate {
    /// Creates a validated activity date
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the month is outside 1-12 or the
    /// day does not exist in that month (e.g. 2023-02-29).
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        let max_day = days_in_month(year, month)
            .ok_or_else(|| CoreError::validation(format!("Year {} is out of range", year)))?;
        if day == 0 || day > max_day {
            return Err(CoreError::validation(format!(
                "{}-{:02} has only {} days",
                year, month, max_day
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Builds an activity date from three optional form fields
    ///
    /// All three blank yields `Ok(None)`; a partially filled date is an error.
    pub fn from_parts(
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
    ) -> Result<Option<Self>, CoreError> {
        match (year, month, day) {
            (None, None, None) => Ok(None),
            (Some(y), Some(m), Some(d)) => Self::new(y, m, d).map(Some),
            _ => Err(CoreError::validation(
                "Activity date needs year, month and day together",
            )),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl fmt::Display for ActivityDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Timezone wrapper for the office running the tracker
///
/// Wraps chrono_tz::Tz with string serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl FromStr for Timezone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| CoreError::Configuration(format!("Invalid timezone: {}", s)))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::Asia::Shanghai)
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// The local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        self.to_local(utc).date_naive()
    }
}

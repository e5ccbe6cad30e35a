use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProformaError;

/// A calendar year-month. Every dated event in the engine is floored to one
/// of these before any cash-flow arithmetic. Serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build from a year and a 1-based month. `None` if the month is not 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Calendar quarter, 1..=4
    pub fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }

    /// `YYYY-Qn`
    pub fn quarter_label(&self) -> String {
        format!("{:04}-Q{}", self.year, self.quarter())
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    /// Shift by `n` months (negative moves backwards).
    pub fn add_months(&self, n: i64) -> Self {
        Self::from_ordinal(self.ordinal() + n)
    }

    /// Signed whole-month distance: `(self.year - earlier.year) * 12 + (self.month - earlier.month)`.
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

/// Calendar months from `from` to `to`, ignoring the day of month.
/// Negative when `to` is in an earlier month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    YearMonth::from_date(to).months_since(YearMonth::from_date(from))
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ProformaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProformaError::DateError(format!("'{s}' is not a YYYY-MM month"));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Forecast run times.
//!
//! A run is identified by the local hour it was generated in, written as
//! `YYYY-MM-DD-HH`. That string names the run directory and is what the
//! index stores as a station's latest run.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, CacheResult};

pub const RUN_TIME_FORMAT: &str = "%Y-%m-%d-%H";

/// A run time truncated to the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTime(NaiveDateTime);

impl RunTime {
    /// The current local hour.
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    /// Truncate a wall-clock time to its hour.
    pub fn from_naive(time: NaiveDateTime) -> Self {
        Self(time.date().and_hms_opt(time.hour(), 0, 0).unwrap_or(time))
    }

    /// Parse a normalized `YYYY-MM-DD-HH` string.
    ///
    /// Only the canonical zero-padded form is accepted, so that a parsed run
    /// time always names the same directory as the string it came from.
    pub fn parse(text: &str) -> CacheResult<Self> {
        let invalid = || CacheError::InvalidRunTime(text.to_string());

        let (date, hour) = text.rsplit_once('-').ok_or_else(invalid)?;
        if hour.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
        let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(invalid)?;

        let run = Self(date.and_time(time));
        if run.to_string() != text {
            return Err(invalid());
        }
        Ok(run)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for RunTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(RUN_TIME_FORMAT))
    }
}

impl FromStr for RunTime {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

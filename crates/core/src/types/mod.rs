//! Shared type definitions and newtypes

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Progress toward the next level, as a ratio clamped to `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress(f64);

impl Progress {
    /// Build from a raw ratio, clamping into `[0.0, 1.0]`
    pub fn new(ratio: f64) -> Self {
        Progress(ratio.clamp(0.0, 1.0))
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Check if the level threshold has been reached
    pub fn is_complete(&self) -> bool {
        self.0 >= 1.0
    }
}

/// Calendar date of a daily check-in, in the classroom's reference offset
///
/// Stored and keyed as `YYYY-MM-DD`. Two instants on the same wall-clock day
/// in the reference offset map to the same `CheckinDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckinDate(NaiveDate);

impl CheckinDate {
    pub fn new(date: NaiveDate) -> Self {
        CheckinDate(date)
    }

    /// Parse a `YYYY-MM-DD` key
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(CheckinDate)
            .map_err(|e| Error::InvalidData(format!("Bad check-in date '{}': {}", s, e)))
    }

    /// Calendar date of `instant` in a fixed UTC offset (hours east)
    pub fn from_instant(instant: DateTime<Utc>, utc_offset_hours: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            Error::InvalidData(format!("Bad UTC offset: {} hours", utc_offset_hours))
        })?;
        Ok(CheckinDate(instant.with_timezone(&offset).date_naive()))
    }

    /// The `YYYY-MM-DD` document key for this date
    pub fn key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for CheckinDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

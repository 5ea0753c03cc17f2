use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InflaError;
use crate::types::YearMonth;
use crate::InflaResult;

/// Request-independent analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Earliest start date accepted for a range.
    pub earliest_start: NaiveDate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            // first year of the built-in inflation table
            earliest_start: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// A calendar year or an explicit inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisRange {
    Year { year: i32 },
    Dates { start: NaiveDate, end: NaiveDate },
}

impl AnalysisRange {
    pub fn year(year: i32) -> Self {
        AnalysisRange::Year { year }
    }

    pub fn dates(start: NaiveDate, end: NaiveDate) -> Self {
        AnalysisRange::Dates { start, end }
    }

    /// Inclusive first and last calendar dates.
    pub fn bounds(&self) -> InflaResult<(NaiveDate, NaiveDate)> {
        match *self {
            AnalysisRange::Year { year } => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| InflaError::DateError(format!("year {year} out of range")))?;
                let end = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| InflaError::DateError(format!("year {year} out of range")))?;
                Ok((start, end))
            }
            AnalysisRange::Dates { start, end } => Ok((start, end)),
        }
    }

    /// First and last calendar months walked by the amortizer.
    pub fn months(&self) -> InflaResult<(YearMonth, YearMonth)> {
        let (start, end) = self.bounds()?;
        Ok((YearMonth::of(start), YearMonth::of(end)))
    }

    /// Reject empty or reversed ranges and starts before `earliest_start`.
    pub fn validate(&self, config: &AnalysisConfig) -> InflaResult<()> {
        let (start, end) = self.bounds()?;
        if start >= end {
            return Err(InflaError::InvalidInput {
                field: "range".into(),
                reason: format!("start date {start} must be before end date {end}"),
            });
        }
        if start < config.earliest_start {
            return Err(InflaError::InvalidInput {
                field: "range".into(),
                reason: format!(
                    "start date {start} is before the earliest supported date {}",
                    config.earliest_start
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisRange::Year { year } => write!(f, "{year}"),
            AnalysisRange::Dates { start, end } => write!(f, "{start} to {end}"),
        }
    }
}

/// Every calendar year touched by `start..=end`.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> Vec<i32> {
    (start.year()..=end.year()).collect()
}

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

pub use rust_decimal::Decimal;

use crate::error::InflaError;
use crate::InflaResult;

/// Closing prices and expression values.
pub type Price = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates and returns expressed as percentages (5 = 5%). Only used at the
/// boundaries: inflation table entries and reported returns.
pub type Percent = Decimal;

/// Multiplicative growth factor where 1.0 means no change.
pub type Factor = Decimal;

/// A calendar month. Ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1 = January, 12 = December
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> InflaResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(InflaError::DateError(format!(
                "month {month} out of range 1-12"
            )));
        }
        Ok(YearMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> InflaResult<Self> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| InflaError::DateError(format!("expected YYYY-MM, got '{s}'")))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| InflaError::DateError(format!("bad year in '{s}'")))?;
        let month = m
            .parse::<u32>()
            .map_err(|_| InflaError::DateError(format!("bad month in '{s}'")))?;
        YearMonth::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result with methodology, assumptions and the time elapsed since
/// `started`.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: started.elapsed().as_micros() as u64,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_parse() {
        let ym = YearMonth::parse("2023-12").unwrap();
        assert_eq!(ym, YearMonth { year: 2023, month: 12 });
        assert_eq!(ym.to_string(), "2023-12");
    }

    #[test]
    fn test_year_month_rejects_bad_month() {
        assert!(YearMonth::new(2023, 13).is_err());
        assert!(YearMonth::new(2023, 0).is_err());
        assert!(YearMonth::parse("2023").is_err());
    }

    #[test]
    fn test_year_month_ordering() {
        let a = YearMonth::new(2022, 12).unwrap();
        let b = YearMonth::new(2023, 1).unwrap();
        assert!(a < b);
    }
}

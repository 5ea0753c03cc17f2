//! Retroactive split / reverse-split correction of raw closes.
//!
//! Two kinds of rule:
//!
//! - **Divisor**: every close on or before the table's global `cutoff` date is
//!   divided by the ticker's divisor.
//! - **Compound**: closes strictly before `split_date` are divided by
//!   `pre_divisor`; the close exactly on `split_date` is multiplied by
//!   `multiplier`; later closes are left alone.
//!
//! Unregistered tickers pass through unchanged. Adjustment is NOT idempotent:
//! a series must be adjusted exactly once, straight after it is fetched and
//! before it is merged with any other series. Adjusting twice divides twice.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::InflaError;
use crate::series::PriceSeries;
use crate::InflaResult;

/// Divisor before a split date plus a multiplier on the split date itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSplit {
    pub split_date: NaiveDate,
    pub pre_divisor: Decimal,
    pub multiplier: Decimal,
}

/// The rule that applies to one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    Divisor { cutoff: NaiveDate, divisor: Decimal },
    Compound(CompoundSplit),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSplitTable {
    cutoff: NaiveDate,
    #[serde(default)]
    divisors: BTreeMap<String, Decimal>,
    #[serde(default)]
    compound: BTreeMap<String, CompoundSplit>,
}

/// Registered split adjustments, keyed by ticker. Loaded once, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSplitTable", into = "RawSplitTable")]
pub struct SplitTable {
    cutoff: NaiveDate,
    divisors: BTreeMap<String, Decimal>,
    compound: BTreeMap<String, CompoundSplit>,
}

impl SplitTable {
    /// An empty table with the given global cutoff date.
    pub fn new(cutoff: NaiveDate) -> Self {
        SplitTable {
            cutoff,
            divisors: BTreeMap::new(),
            compound: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> InflaResult<Self> {
        let raw: RawSplitTable = serde_json::from_str(json)?;
        SplitTable::try_from(raw)
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Register a divisor applied to closes on or before the cutoff.
    pub fn with_divisor(mut self, ticker: &str, divisor: Decimal) -> InflaResult<Self> {
        check_non_zero(ticker, "divisor", divisor)?;
        self.divisors.insert(ticker.to_string(), divisor);
        Ok(self)
    }

    /// Register a compound rule. Takes precedence over a plain divisor.
    pub fn with_compound(mut self, ticker: &str, rule: CompoundSplit) -> InflaResult<Self> {
        check_non_zero(ticker, "pre_divisor", rule.pre_divisor)?;
        self.compound.insert(ticker.to_string(), rule);
        Ok(self)
    }

    pub fn rule(&self, ticker: &str) -> Option<SplitRule> {
        if let Some(c) = self.compound.get(ticker) {
            return Some(SplitRule::Compound(*c));
        }
        self.divisors.get(ticker).map(|d| SplitRule::Divisor {
            cutoff: self.cutoff,
            divisor: *d,
        })
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.compound
            .keys()
            .chain(self.divisors.keys())
            .map(String::as_str)
    }

    /// Apply the ticker's rule to `series`, rewriting closes only.
    pub fn adjust(&self, mut series: PriceSeries, ticker: &str) -> PriceSeries {
        match self.rule(ticker) {
            None => {}
            Some(SplitRule::Divisor { cutoff, divisor }) => {
                debug!(ticker, %divisor, %cutoff, "applying split divisor");
                series.update_closes(|date, close| {
                    if date <= cutoff {
                        *close /= divisor;
                    }
                });
            }
            Some(SplitRule::Compound(rule)) => {
                debug!(ticker, split_date = %rule.split_date, "applying compound split");
                series.update_closes(|date, close| {
                    if date < rule.split_date {
                        *close /= rule.pre_divisor;
                    } else if date == rule.split_date {
                        *close *= rule.multiplier;
                    }
                });
            }
        }
        series
    }
}

impl Default for SplitTable {
    /// No registered adjustments.
    fn default() -> Self {
        SplitTable::new(NaiveDate::MIN)
    }
}

impl TryFrom<RawSplitTable> for SplitTable {
    type Error = InflaError;

    fn try_from(raw: RawSplitTable) -> InflaResult<Self> {
        let mut table = SplitTable::new(raw.cutoff);
        for (ticker, divisor) in raw.divisors {
            table = table.with_divisor(&ticker, divisor)?;
        }
        for (ticker, rule) in raw.compound {
            table = table.with_compound(&ticker, rule)?;
        }
        Ok(table)
    }
}

impl From<SplitTable> for RawSplitTable {
    fn from(table: SplitTable) -> Self {
        RawSplitTable {
            cutoff: table.cutoff,
            divisors: table.divisors,
            compound: table.compound,
        }
    }
}

fn check_non_zero(ticker: &str, field: &str, value: Decimal) -> InflaResult<()> {
    if value.is_zero() {
        return Err(InflaError::InvalidInput {
            field: format!("splits.{ticker}.{field}"),
            reason: "must be non-zero".into(),
        });
    }
    Ok(())
}

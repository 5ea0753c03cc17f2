//! Daily closing-price series aligned to a trading calendar.
//!
//! A [`PriceSeries`] always holds strictly increasing, unique dates. The
//! invariant is checked on construction (including deserialization) and
//! cannot be broken afterwards: callers may rewrite closes but never dates.

pub mod merge;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InflaError;
use crate::types::Price;
use crate::InflaResult;

/// One trading-day observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Price,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Price) -> Self {
        PricePoint { date, close }
    }
}

/// Ordered closing prices, one per trading date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build from points that must already be strictly increasing by date.
    pub fn new(points: Vec<PricePoint>) -> InflaResult<Self> {
        if let Some(w) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(InflaError::InvalidInput {
                field: "price_series".into(),
                reason: format!(
                    "dates must be strictly increasing ({} followed by {})",
                    w[0].date, w[1].date
                ),
            });
        }
        Ok(PriceSeries { points })
    }

    /// Sort by date and drop duplicate dates, keeping the last observation
    /// seen for each date.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        // stable sort keeps input order among equal dates
        points.sort_by_key(|p| p.date);
        let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match out.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => out.push(p),
            }
        }
        PriceSeries { points: out }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<Price> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Rewrite closes in place. Dates are passed read-only.
    pub fn update_closes<F>(&mut self, mut f: F)
    where
        F: FnMut(NaiveDate, &mut Price),
    {
        for p in self.points.iter_mut() {
            f(p.date, &mut p.close);
        }
    }

    /// Pair an aligned column of values with this series' dates.
    pub fn from_columns(dates: &[NaiveDate], values: &[Price]) -> InflaResult<Self> {
        if dates.len() != values.len() {
            return Err(InflaError::LengthMismatch {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        PriceSeries::new(
            dates
                .iter()
                .zip(values.iter())
                .map(|(d, v)| PricePoint::new(*d, *v))
                .collect(),
        )
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = InflaError;

    fn try_from(points: Vec<PricePoint>) -> InflaResult<Self> {
        PriceSeries::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::InflaError;
use crate::inflation::amortizer::CumulativeInflationSeries;
use crate::series::PriceSeries;
use crate::types::{with_metadata, ComputationOutput, Percent, Price};
use crate::InflaResult;

/// One point on the shared date axis of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    /// Asset close (or expression / portfolio value).
    pub asset: Price,
    /// First close carried forward at the cumulative inflation rate.
    pub inflation: Price,
}

/// Asset performance against cumulative inflation over the same days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub asset_return_pct: Percent,
    pub inflation_return_pct: Percent,
    /// `asset_return_pct - inflation_return_pct`
    pub difference_pct: Percent,
    /// Asset growth deflated by inflation growth: `(A / I - 1) * 100`
    pub real_return_pct: Percent,
    pub observations: usize,
    pub points: Vec<ChartPoint>,
}

/// Compare an asset series with a cumulative inflation series.
///
/// The two are aligned by position, truncating both to the shorter length.
/// That is not a date join; a length difference is reported as a warning.
pub fn build(
    asset: &PriceSeries,
    inflation: &CumulativeInflationSeries,
) -> InflaResult<ComputationOutput<ComparisonResult>> {
    let started = Instant::now();
    let mut warnings = Vec::new();

    if asset.is_empty() {
        return Err(InflaError::EmptySeries("asset series is empty".into()));
    }

    let n = asset.len().min(inflation.len());
    if asset.len() != inflation.len() {
        let mismatch = InflaError::LengthMismatch {
            expected: asset.len(),
            actual: inflation.len(),
        };
        warn!(asset = asset.len(), inflation = inflation.len(), "truncating to shorter series");
        warnings.push(format!("{mismatch}; both series truncated to {n}"));
    }
    if n == 0 {
        return Err(InflaError::EmptySeries(
            "no inflation observations overlap the asset series".into(),
        ));
    }

    let points = &asset.points()[..n];
    let factors = &inflation.factors[..n];

    let first_close = points[0].close;
    let last_close = points[n - 1].close;
    let last_factor = factors[n - 1];

    if first_close.is_zero() {
        return Err(InflaError::DivisionByZero {
            context: format!("asset return: first close on {} is zero", points[0].date),
        });
    }

    let asset_growth = last_close / first_close;
    let asset_return_pct = (last_close - first_close) / first_close * dec!(100);
    let inflation_return_pct = (last_factor - Decimal::ONE) * dec!(100);
    let difference_pct = asset_return_pct - inflation_return_pct;
    let real_return_pct = if last_factor.is_zero() {
        Decimal::ZERO
    } else {
        (asset_growth / last_factor - Decimal::ONE) * dec!(100)
    };

    let chart = points
        .iter()
        .zip(factors.iter())
        .map(|(p, f)| ChartPoint {
            date: p.date,
            asset: p.close,
            inflation: first_close * f,
        })
        .collect();

    let result = ComparisonResult {
        asset_return_pct,
        inflation_return_pct,
        difference_pct,
        real_return_pct,
        observations: n,
        points: chart,
    };

    Ok(with_metadata(
        "Point-to-point asset return vs compounded daily-amortized inflation",
        &serde_json::json!({
            "first_date": points[0].date,
            "last_date": points[n - 1].date,
            "first_close": first_close.to_string(),
            "alignment": "positional truncation to shorter series",
        }),
        warnings,
        started,
        result,
    ))
}

//! End-to-end comparison of a target against inflation for one or more ranges.
//!
//! Per range: fetch every needed ticker concurrently, split-adjust each
//! fetched series exactly once, merge on date, evaluate the expression or
//! portfolio, amortize inflation over the resulting trading dates and build
//! the comparison.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::adjust::SplitTable;
use crate::analysis::range::{AnalysisConfig, AnalysisRange};
use crate::analysis::source::{fetch_all, PriceSource};
use crate::analysis::target::{Holding, PreparedTarget, Target};
use crate::error::InflaError;
use crate::inflation::amortizer::{amortize, MonthContribution};
use crate::inflation::table::InflationTable;
use crate::report::comparison::{self, ComparisonResult};
use crate::series::merge::{merge_on_date, MergedColumns};
use crate::series::PriceSeries;
use crate::types::{with_metadata, ComputationOutput, Price};
use crate::InflaResult;

/// Read-only configuration shared by every request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub inflation: InflationTable,
    pub splits: SplitTable,
    pub config: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub target: Target,
    pub range: AnalysisRange,
}

/// A finished comparison for one range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub label: String,
    pub range: AnalysisRange,
    pub source: String,
    /// Tickers that were left out of a portfolio because their prices were
    /// unavailable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted_tickers: Vec<String>,
    pub months: Vec<MonthContribution>,
    pub comparison: ComparisonResult,
}

/// Outcome of one year in [`compare_years`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearOutcome {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ComputationOutput<Comparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compare `request.target` with inflation over `request.range`.
pub fn compare<S>(
    request: &CompareRequest,
    source: &S,
    ctx: &AnalysisContext,
) -> InflaResult<ComputationOutput<Comparison>>
where
    S: PriceSource + ?Sized,
{
    let target = request.target.prepare()?;
    compare_prepared(&target, request.range, source, ctx)
}

/// Run one comparison per year. A failing year is recorded and the loop moves
/// on; only an invalid target fails the whole call.
pub fn compare_years<S>(
    target: &Target,
    years: &[i32],
    source: &S,
    ctx: &AnalysisContext,
) -> InflaResult<Vec<YearOutcome>>
where
    S: PriceSource + ?Sized,
{
    let prepared = target.prepare()?;
    Ok(years
        .iter()
        .map(|&year| {
            match compare_prepared(&prepared, AnalysisRange::year(year), source, ctx) {
                Ok(output) => YearOutcome {
                    year,
                    output: Some(output),
                    error: None,
                },
                Err(e) => {
                    warn!(year, error = %e, "comparison failed, continuing with next year");
                    YearOutcome {
                        year,
                        output: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect())
}

/// Compare an already prepared target over `range`.
pub fn compare_prepared<S>(
    target: &PreparedTarget,
    range: AnalysisRange,
    source: &S,
    ctx: &AnalysisContext,
) -> InflaResult<ComputationOutput<Comparison>>
where
    S: PriceSource + ?Sized,
{
    let started = Instant::now();
    range.validate(&ctx.config)?;
    let (start, end) = range.bounds()?;
    let (start_month, end_month) = range.months()?;
    let mut warnings = Vec::new();

    let fetched = load_adjusted(target, source, ctx, start, end);
    let mut omitted = Vec::new();
    let mut available: Vec<(String, PriceSeries)> = Vec::new();
    for (ticker, result) in fetched {
        match result {
            Ok(series) => available.push((ticker, series)),
            Err(e) => match target {
                PreparedTarget::Portfolio(_) => {
                    warnings.push(format!("{ticker} omitted from portfolio: {e}"));
                    omitted.push(ticker);
                }
                _ => return Err(e),
            },
        }
    }

    let asset = match target {
        PreparedTarget::Ticker(_) => available
            .pop()
            .map(|(_, s)| s)
            .ok_or_else(|| InflaError::EmptySeries("no price data".into()))?,
        PreparedTarget::Expression(expr) => {
            let columns = merge_columns(target, &available)?;
            let values = expr.evaluate(&columns.columns)?;
            PriceSeries::from_columns(&columns.dates, &values)?
        }
        PreparedTarget::Portfolio(holdings) => {
            if available.is_empty() {
                return Err(InflaError::EmptySeries(
                    "no portfolio holding has price data".into(),
                ));
            }
            let columns = merge_columns(target, &available)?;
            let values = portfolio_values(target, holdings, &columns.columns, columns.dates.len());
            PriceSeries::from_columns(&columns.dates, &values)?
        }
    };

    let amortized = amortize(&ctx.inflation, &asset.dates(), start_month, end_month)?;
    warnings.extend(amortized.warnings);

    let built = comparison::build(&asset, &amortized.series)?;
    warnings.extend(built.warnings);

    let label = target.label();
    info!(
        target = label.as_str(),
        %range,
        asset_return_pct = %built.result.asset_return_pct.round_dp(2),
        inflation_return_pct = %built.result.inflation_return_pct.round_dp(2),
        "comparison built"
    );

    let result = Comparison {
        label,
        range,
        source: source.name().to_string(),
        omitted_tickers: omitted,
        months: amortized.months,
        comparison: built.result,
    };

    Ok(with_metadata(
        "Split-adjusted closes vs monthly inflation amortized over trading days",
        &serde_json::json!({
            "range": range.to_string(),
            "tickers": target.tickers(),
            "inflation_years": ctx.inflation.years().collect::<Vec<_>>(),
            "split_cutoff": ctx.splits.cutoff(),
        }),
        warnings,
        started,
        result,
    ))
}

/// Fetch all tickers for `target`, then split-adjust and range-filter each
/// successful series. Adjustment happens here and nowhere else.
fn load_adjusted<S>(
    target: &PreparedTarget,
    source: &S,
    ctx: &AnalysisContext,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(String, InflaResult<PriceSeries>)>
where
    S: PriceSource + ?Sized,
{
    let tickers = target.tickers();
    fetch_all(source, &tickers, start, end)
        .into_iter()
        .map(|(ticker, result)| {
            let adjusted = result.and_then(|raw| {
                let series = ctx.splits.adjust(raw, &ticker).between(start, end);
                if series.is_empty() {
                    Err(InflaError::EmptyPriceSeries {
                        ticker: ticker.clone(),
                    })
                } else {
                    Ok(series)
                }
            });
            (ticker, adjusted)
        })
        .collect()
}

fn merge_columns(
    target: &PreparedTarget,
    available: &[(String, PriceSeries)],
) -> InflaResult<MergedColumns> {
    let inputs: Vec<(String, &PriceSeries)> = available
        .iter()
        .map(|(ticker, series)| (target.column_key(ticker), series))
        .collect();
    merge_on_date(&inputs)
}

/// `Σ weight × close` per row over the holdings that have a column.
fn portfolio_values(
    target: &PreparedTarget,
    holdings: &[Holding],
    columns: &BTreeMap<String, Vec<Price>>,
    rows: usize,
) -> Vec<Price> {
    let mut values = vec![Decimal::ZERO; rows];
    for h in holdings {
        if let Some(col) = columns.get(&target.column_key(&h.ticker)) {
            for (v, close) in values.iter_mut().zip(col.iter()) {
                *v += h.weight * close;
            }
        }
    }
    values
}

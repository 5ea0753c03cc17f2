//! Daily amortization of monthly inflation over a trading calendar.
//!
//! A month's inflation is spread over however many trading days the price
//! series actually has in that month, with exact compounding:
//!
//! ```text
//!   d = (1 + r)^(1/n) - 1        r = monthly percent / 100
//!   (1 + d)^n = 1 + r            n = trading days observed in the month
//! ```
//!
//! The running product starts at 1 and one factor is emitted per covered
//! trading date, so element *i* is the index level after day *i* relative to
//! the start of the range. Years absent from the [`InflationTable`] contribute
//! no days at all, which means the output can be shorter than the trading
//! calendar and callers must align explicitly.
//!
//! Roots are computed with a Newton iteration in `Decimal` rather than
//! `powd`, which drifts in the last digits.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::InflaError;
use crate::inflation::table::InflationTable;
use crate::types::{with_metadata, ComputationOutput, Factor, Percent, Price, Rate, YearMonth};
use crate::InflaResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const NEWTON_ITERATIONS: u32 = 60;
const NEWTON_TOLERANCE: Decimal = dec!(0.0000000000000000000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cumulative inflation factors, one per covered trading date.
///
/// The implicit factor before the first element is exactly 1 and is not
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeInflationSeries {
    pub dates: Vec<NaiveDate>,
    pub factors: Vec<Factor>,
}

impl CumulativeInflationSeries {
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn last_factor(&self) -> Option<Factor> {
        self.factors.last().copied()
    }

    /// `base * factor[i]` for each element: the price a value of `base` at
    /// the start of the range would need to keep pace with inflation.
    pub fn rebase(&self, base: Price) -> Vec<Price> {
        self.factors.iter().map(|f| base * f).collect()
    }
}

/// How one calendar month contributed to the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthContribution {
    pub month: YearMonth,
    pub monthly_rate_pct: Percent,
    pub trading_days: usize,
    pub daily_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amortization {
    pub series: CumulativeInflationSeries,
    pub months: Vec<MonthContribution>,
    /// Years in the range with no table entry.
    pub skipped_years: Vec<i32>,
    pub warnings: Vec<String>,
}

/// Serializable request for [`calculate_cumulative_inflation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizeInput {
    pub trading_dates: Vec<NaiveDate>,
    pub start: YearMonth,
    pub end: YearMonth,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortize monthly inflation over `trading_dates` for months `start..=end`.
///
/// `trading_dates` must be strictly increasing. Trading dates outside the
/// month range, or inside a year the table does not cover, are ignored.
pub fn amortize(
    table: &InflationTable,
    trading_dates: &[NaiveDate],
    start: YearMonth,
    end: YearMonth,
) -> InflaResult<Amortization> {
    if start > end {
        return Err(InflaError::InvalidInput {
            field: "start".into(),
            reason: format!("start month {start} is after end month {end}"),
        });
    }
    if let Some(w) = trading_dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(InflaError::InvalidInput {
            field: "trading_dates".into(),
            reason: format!(
                "dates must be strictly increasing ({} followed by {})",
                w[0], w[1]
            ),
        });
    }

    let mut warnings = Vec::new();
    let mut skipped_years = Vec::new();
    let mut months = Vec::new();
    let mut series = CumulativeInflationSeries::default();
    let mut cumulative = Decimal::ONE;

    for year in start.year..=end.year {
        let Some(rates) = table.year(year) else {
            let uncovered = trading_dates
                .iter()
                .filter(|d| {
                    d.year() == year && YearMonth::of(**d) >= start && YearMonth::of(**d) <= end
                })
                .count();
            let msg = format!(
                "{}; {uncovered} trading days left without inflation",
                InflaError::MissingInflationYear(year)
            );
            warn!(year, uncovered, "no inflation data for year, skipping");
            warnings.push(msg);
            skipped_years.push(year);
            continue;
        };

        let first_month = if year == start.year { start.month } else { 1 };
        let last_month = if year == end.year { end.month } else { 12 };

        for month in first_month..=last_month {
            let ym = YearMonth { year, month };
            let days: Vec<NaiveDate> = trading_dates
                .iter()
                .copied()
                .filter(|d| ym.contains(*d))
                .collect();
            let n = days.len();
            if n == 0 {
                continue;
            }

            let percent = rates[month as usize - 1];
            let mut growth = Decimal::ONE + percent / dec!(100);
            if growth <= Decimal::ZERO {
                warn!(%ym, %percent, "monthly rate implies non-positive index, using 0%");
                warnings.push(format!(
                    "{ym}: monthly rate {percent}% implies a non-positive index; treated as 0%"
                ));
                growth = Decimal::ONE;
            }

            let daily_growth = nth_root(growth, n as u32);
            debug!(%ym, trading_days = n, %daily_growth, "amortized month");

            for day in days {
                cumulative *= daily_growth;
                series.dates.push(day);
                series.factors.push(cumulative);
            }

            months.push(MonthContribution {
                month: ym,
                monthly_rate_pct: percent,
                trading_days: n,
                daily_rate: daily_growth - Decimal::ONE,
            });
        }
    }

    Ok(Amortization {
        series,
        months,
        skipped_years,
        warnings,
    })
}

/// Amortize over the full calendar year `year`.
pub fn amortize_year(
    table: &InflationTable,
    trading_dates: &[NaiveDate],
    year: i32,
) -> InflaResult<Amortization> {
    amortize(
        table,
        trading_dates,
        YearMonth { year, month: 1 },
        YearMonth { year, month: 12 },
    )
}

/// [`amortize`] wrapped in the standard output envelope.
pub fn calculate_cumulative_inflation(
    input: &AmortizeInput,
    table: &InflationTable,
) -> InflaResult<ComputationOutput<Amortization>> {
    let started = Instant::now();
    let mut result = amortize(table, &input.trading_dates, input.start, input.end)?;
    let warnings = std::mem::take(&mut result.warnings);

    Ok(with_metadata(
        "Monthly inflation compounded per trading day: d = (1 + r)^(1/n) - 1",
        &serde_json::json!({
            "start": input.start.to_string(),
            "end": input.end.to_string(),
            "trading_dates": input.trading_dates.len(),
        }),
        warnings,
        started,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Math helpers
// ---------------------------------------------------------------------------

/// `x^(1/n)` for `x > 0` by Newton's method.
pub(crate) fn nth_root(x: Decimal, n: u32) -> Decimal {
    if n <= 1 || x == Decimal::ONE || x <= Decimal::ZERO {
        return x;
    }

    let n_dec = Decimal::from(n);
    let n_minus_1 = n_dec - Decimal::ONE;

    // first-order Taylor guess, close to the root for x near 1
    let mut guess = Decimal::ONE + (x - Decimal::ONE) / n_dec;

    for _ in 0..NEWTON_ITERATIONS {
        let power = pow_u32(guess, n - 1);
        if power.is_zero() {
            break;
        }
        let next = (n_minus_1 * guess + x / power) / n_dec;
        let delta = (next - guess).abs();
        guess = next;
        if delta < NEWTON_TOLERANCE {
            break;
        }
    }

    guess
}

/// Integer power by repeated multiplication.
pub(crate) fn pow_u32(base: Decimal, n: u32) -> Decimal {
    let mut out = Decimal::ONE;
    for _ in 0..n {
        out *= base;
    }
    out
}

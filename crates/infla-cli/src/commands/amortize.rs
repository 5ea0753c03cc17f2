use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use infla_core::analysis::AnalysisContext;
use infla_core::inflation::amortizer::{calculate_cumulative_inflation, AmortizeInput, MonthContribution};
use infla_core::{ComputationOutput, YearMonth};

use crate::input;

/// Arguments for cumulative inflation over a trading calendar
#[derive(Args)]
pub struct AmortizeArgs {
    /// First month (YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    pub start: YearMonth,

    /// Last month (YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    pub end: YearMonth,

    /// JSON file with a list of trading dates; read from stdin when omitted
    #[arg(long)]
    pub dates: Option<String>,
}

#[derive(Debug, Serialize)]
struct FactorPoint {
    date: NaiveDate,
    factor: Decimal,
}

#[derive(Debug, Serialize)]
struct AmortizeOutput {
    cumulative_inflation_pct: Decimal,
    trading_days: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped_years: Vec<i32>,
    months: Vec<MonthContribution>,
    points: Vec<FactorPoint>,
}

fn parse_month(s: &str) -> Result<YearMonth, String> {
    YearMonth::parse(s).map_err(|e| e.to_string())
}

pub fn run_amortize(args: AmortizeArgs, ctx: &AnalysisContext) -> Result<Value, Box<dyn std::error::Error>> {
    let trading_dates: Vec<NaiveDate> = if let Some(ref path) = args.dates {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--dates <file.json> or stdin required for amortize".into());
    };

    let amortize_input = AmortizeInput {
        trading_dates,
        start: args.start,
        end: args.end,
    };
    let out = calculate_cumulative_inflation(&amortize_input, &ctx.inflation)?;

    let series = out.result.series;
    let cumulative_inflation_pct = series
        .last_factor()
        .map(|f| (f - Decimal::ONE) * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO);
    let points = series
        .dates
        .iter()
        .zip(series.factors.iter())
        .map(|(date, factor)| FactorPoint {
            date: *date,
            factor: *factor,
        })
        .collect::<Vec<_>>();

    let result = ComputationOutput {
        result: AmortizeOutput {
            cumulative_inflation_pct,
            trading_days: points.len(),
            skipped_years: out.result.skipped_years,
            months: out.result.months,
            points,
        },
        methodology: out.methodology,
        assumptions: out.assumptions,
        warnings: out.warnings,
        metadata: out.metadata,
    };
    Ok(serde_json::to_value(result)?)
}

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use infla_core::analysis::AnalysisContext;
use infla_core::inflation::table::MonthlyRate;

#[derive(Args)]
pub struct InflationArgs {
    /// Only show this year
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct YearSummary {
    year: i32,
    annual_inflation_pct: Decimal,
    months: Vec<MonthlyRate>,
}

pub fn run_inflation(args: InflationArgs, ctx: &AnalysisContext) -> Result<Value, Box<dyn std::error::Error>> {
    let table = &ctx.inflation;
    let years: Vec<i32> = match args.year {
        Some(year) => {
            table.require_year(year)?;
            vec![year]
        }
        None => table.years().collect(),
    };

    let rates = table.months();
    let summaries = years
        .into_iter()
        .map(|year| {
            let annual = table.annual_factor(year)?;
            Ok(YearSummary {
                year,
                annual_inflation_pct: (annual - Decimal::ONE) * Decimal::ONE_HUNDRED,
                months: rates.iter().filter(|r| r.year == year).copied().collect(),
            })
        })
        .collect::<Result<Vec<_>, infla_core::InflaError>>()?;

    Ok(serde_json::to_value(summaries)?)
}

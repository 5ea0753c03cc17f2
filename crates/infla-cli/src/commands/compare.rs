use chrono::{Datelike, NaiveDate};
use clap::Args;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use infla_core::analysis::range::years_between;
use infla_core::analysis::{
    compare, compare_years, AnalysisContext, AnalysisRange, CompareRequest, Holding,
    StaticPriceSource, Target,
};
use infla_core::series::{PricePoint, PriceSeries};

use crate::input;

/// Arguments for an asset-vs-inflation comparison
#[derive(Args)]
pub struct CompareArgs {
    /// JSON file of raw closes per ticker: {"GGAL.BA": [{"date": "2023-01-02", "close": "310.5"}]}.
    /// Read from stdin when omitted.
    #[arg(long)]
    pub prices: Option<String>,

    /// Single ticker, e.g. GGAL.BA
    #[arg(long, conflicts_with_all = ["expression", "portfolio"])]
    pub ticker: Option<String>,

    /// Ticker expression, e.g. "GGAL.BA*0.5+PAMP.BA*0.2"
    #[arg(long, conflicts_with = "portfolio")]
    pub expression: Option<String>,

    /// JSON file with portfolio holdings: [{"ticker": "GGAL.BA", "weight": "10"}]
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Calendar years to compare, one comparison each (e.g. 2022,2023)
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["start", "end"])]
    pub year: Vec<i32>,

    /// First date of the range (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last date of the range (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Split --start..--end into one comparison per calendar year. Whole
    /// years are analysed: a start after Jan 1 or an end before Dec 31 is
    /// widened to the full year
    #[arg(long, requires = "start")]
    pub per_year: bool,
}

pub fn run_compare(args: CompareArgs, ctx: &AnalysisContext) -> Result<Value, Box<dyn std::error::Error>> {
    let target = target_from_args(&args)?;
    let source = load_prices(&args.prices)?;

    if !args.year.is_empty() {
        let outcomes = compare_years(&target, &args.year, &source, ctx)?;
        return Ok(serde_json::to_value(outcomes)?);
    }

    let (start, end) = match (args.start, args.end) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err("Provide --year or both --start and --end".into()),
    };

    if args.per_year {
        if widens_to_years(start, end) {
            warn!(%start, %end, "--per-year analyses whole calendar years; range bounds widened");
        }
        let outcomes = compare_years(&target, &years_between(start, end), &source, ctx)?;
        return Ok(serde_json::to_value(outcomes)?);
    }

    let request = CompareRequest {
        target,
        range: AnalysisRange::dates(start, end),
    };
    let result = compare(&request, &source, ctx)?;
    Ok(serde_json::to_value(result)?)
}

/// True when `start..=end` does not already cover whole calendar years.
fn widens_to_years(start: NaiveDate, end: NaiveDate) -> bool {
    (start.month(), start.day()) != (1, 1) || (end.month(), end.day()) != (12, 31)
}

fn target_from_args(args: &CompareArgs) -> Result<Target, Box<dyn std::error::Error>> {
    if let Some(ref ticker) = args.ticker {
        Ok(Target::Ticker(ticker.clone()))
    } else if let Some(ref expr) = args.expression {
        Ok(Target::Expression(expr.clone()))
    } else if let Some(ref path) = args.portfolio {
        let holdings: Vec<Holding> = input::file::read_json(path)?;
        Ok(Target::Portfolio(holdings))
    } else {
        Err("Provide one of --ticker, --expression or --portfolio".into())
    }
}

/// Price file (or piped JSON) into an in-memory source. Points may come in
/// any order; duplicate dates keep the last close.
fn load_prices(path: &Option<String>) -> Result<StaticPriceSource, Box<dyn std::error::Error>> {
    let raw: BTreeMap<String, Vec<PricePoint>> = if let Some(ref path) = path {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--prices <file.json> or stdin required for compare".into());
    };

    let series = raw
        .into_iter()
        .map(|(ticker, points)| (ticker, PriceSeries::from_unsorted(points)))
        .collect();
    let name = path.as_deref().unwrap_or("stdin");
    Ok(StaticPriceSource::new(name, series))
}

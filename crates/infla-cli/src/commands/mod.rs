pub mod amortize;
pub mod compare;
pub mod expression;
pub mod inflation;

use infla_core::adjust::SplitTable;
use infla_core::analysis::AnalysisContext;
use infla_core::inflation::table::InflationTable;

use crate::input;

/// Built-in tables, overridden by `--inflation-table` / `--splits` files.
pub fn load_context(
    inflation_table: &Option<String>,
    splits: &Option<String>,
) -> Result<AnalysisContext, Box<dyn std::error::Error>> {
    let mut ctx = AnalysisContext::default();
    if let Some(ref path) = inflation_table {
        let table: InflationTable = input::file::read_json(path)?;
        if table.is_empty() {
            return Err(format!("Inflation table '{}' has no years", path).into());
        }
        ctx.inflation = table;
    }
    if let Some(ref path) = splits {
        let table: SplitTable = input::file::read_json(path)?;
        ctx.splits = table;
    }
    Ok(ctx)
}

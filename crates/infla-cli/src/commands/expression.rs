use clap::Args;
use serde_json::Value;

use infla_core::expression;

#[derive(Args)]
pub struct ParseArgs {
    /// Ticker expression, e.g. "GGAL.BA + TXR.BA/ALUA.BA"
    #[arg(long)]
    pub expression: String,
}

pub fn run_parse(args: ParseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parsed = expression::parse(&args.expression)?;
    Ok(serde_json::json!({ "result": parsed }))
}

mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortize::AmortizeArgs;
use commands::compare::CompareArgs;
use commands::expression::ParseArgs;
use commands::inflation::InflationArgs;

/// Equity and ticker-expression returns against cumulative inflation
#[derive(Parser)]
#[command(
    name = "infla",
    version,
    about = "Compare equity returns against cumulative inflation",
    long_about = "Compares the price performance of a ticker, a ticker expression such as \
                  'GGAL.BA*0.5+PAMP.BA*0.2' or a weighted portfolio with monthly inflation \
                  amortized over the asset's trading days. All arithmetic is decimal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON inflation table replacing the built-in one
    #[arg(long, global = true)]
    inflation_table: Option<String>,

    /// JSON split table replacing the built-in one
    #[arg(long, global = true)]
    splits: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a ticker, expression or portfolio with inflation
    Compare(CompareArgs),
    /// Cumulative inflation over a list of trading dates
    Amortize(AmortizeArgs),
    /// Parse and normalize a ticker expression
    Parse(ParseArgs),
    /// Show the monthly inflation table
    Inflation(InflationArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    // stdout carries the payload; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let context = || commands::load_context(&cli.inflation_table, &cli.splits);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compare(args) => {
            context().and_then(|ctx| commands::compare::run_compare(args, &ctx))
        }
        Commands::Amortize(args) => {
            context().and_then(|ctx| commands::amortize::run_amortize(args, &ctx))
        }
        Commands::Inflation(args) => {
            context().and_then(|ctx| commands::inflation::run_inflation(args, &ctx))
        }
        Commands::Parse(args) => commands::expression::run_parse(args),
        Commands::Version => {
            println!("infla {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::Level;

use commands::pricing::{GreeksArgs, ImpliedVolArgs, PriceArgs};
use commands::strategy::{ExportCsvArgs, PresetArgs, SimulateArgs, ValidateArgs};

/// Options-strategy payoff, Greeks and breakeven simulation
#[derive(Parser)]
#[command(
    name = "optlab",
    version,
    about = "Options-strategy payoff, Greeks and breakeven simulation",
    long_about = "A CLI for pricing European options with Black-Scholes-Merton and \
                  simulating multi-leg option strategies with decimal precision. \
                  Supports pricing, Greeks, implied volatility, strategy validation, \
                  P/L simulation, preset strategies, and CSV export."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log simulation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a European option (Black-Scholes-Merton)
    Price(PriceArgs),
    /// Analytic Greeks for a single option
    Greeks(GreeksArgs),
    /// Solve for the volatility implied by a market price
    ImpliedVol(ImpliedVolArgs),
    /// Check a strategy for structural problems without pricing it
    Validate(ValidateArgs),
    /// Simulate strategy P/L, breakevens, max profit/loss and Greeks
    Simulate(SimulateArgs),
    /// Build a strategy from a named preset
    Preset(PresetArgs),
    /// Simulate a strategy and write its price grid as CSV
    ExportCsv(ExportCsvArgs),
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

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Price(args) => commands::pricing::run_price(args),
        Commands::Greeks(args) => commands::pricing::run_greeks(args),
        Commands::ImpliedVol(args) => commands::pricing::run_implied_vol(args),
        Commands::Validate(args) => commands::strategy::run_validate(args),
        Commands::Simulate(args) => commands::strategy::run_simulate(args),
        Commands::Preset(args) => commands::strategy::run_preset(args),
        Commands::ExportCsv(args) => commands::strategy::run_export_csv(args),
        Commands::Version => {
            println!("optlab {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        // Commands that already wrote their output return null
        Ok(serde_json::Value::Null) => process::exit(0),
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

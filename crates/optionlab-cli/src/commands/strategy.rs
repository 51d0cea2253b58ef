use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{self, BufWriter};

use optionlab_core::export::csv::{parse_csv, summarize_rows, write_csv};
use optionlab_core::simulation::simulator::{analyze_strategy, StrategyAnalysisInput};
use optionlab_core::strategy::presets::{build_preset, PresetParams};
use optionlab_core::strategy::validation::{has_blocking_issues, validate_market, ValidationIssue};
use optionlab_core::{simulate_with_config, validate_strategy, EvaluationMode, MarketParameters, Strategy};

use crate::input;

/// Evaluation mode override on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Today,
    AtExpiration,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Today => EvaluationMode::Today,
            ModeArg::AtExpiration => EvaluationMode::AtExpiration,
        }
    }
}

/// Grid and mode flags shared by `simulate` and `export-csv`; each overrides
/// the matching field of the JSON request.
#[derive(Args)]
pub struct SimulationFlags {
    /// Evaluation mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Number of evenly spaced grid prices
    #[arg(long)]
    pub grid_points: Option<u32>,

    /// Half-width of the automatic price range in standard deviations
    #[arg(long)]
    pub expected_move_multiple: Option<Decimal>,
}

impl SimulationFlags {
    fn apply(&self, request: &mut StrategyAnalysisInput) {
        if let Some(mode) = self.mode {
            request.mode = mode.into();
        }
        if let Some(points) = self.grid_points {
            request.config.grid_points = points;
        }
        if let Some(multiple) = self.expected_move_multiple {
            request.config.expected_move_multiple = multiple;
        }
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValidateRequest {
    strategy: Strategy,
    #[serde(default)]
    market: Option<MarketParameters>,
}

/// Arguments for strategy validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON input file: {"strategy": ..., "market": ...}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ValidateRequest = input::read_input(args.input.as_deref(), "validation")?;
    let mut issues: Vec<ValidationIssue> = validate_strategy(&request.strategy);
    if let Some(market) = &request.market {
        issues.extend(validate_market(market));
    }
    Ok(json!({
        "result": {
            "valid": !has_blocking_issues(&issues),
            "issue_count": issues.len(),
            "issues": issues,
        }
    }))
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

/// Arguments for strategy simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON input file: {"strategy", "market", "mode", "config"}
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub flags: SimulationFlags,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: StrategyAnalysisInput = input::read_input(args.input.as_deref(), "simulation")?;
    args.flags.apply(&mut request);
    let result = analyze_strategy(&request)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// preset
// ---------------------------------------------------------------------------

/// Arguments for building a preset strategy
#[derive(Args)]
pub struct PresetArgs {
    /// Path to JSON input file: {"kind", "underlying_price", "quotes", "time_to_expiration"}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_preset(args: PresetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: PresetParams = input::read_input(args.input.as_deref(), "preset")?;
    let strategy = build_preset(&params)?;
    let issues = validate_strategy(&strategy);
    Ok(json!({
        "result": {
            "strategy": strategy,
            "issues": issues,
        }
    }))
}

// ---------------------------------------------------------------------------
// export-csv
// ---------------------------------------------------------------------------

/// Arguments for CSV export
#[derive(Args)]
pub struct ExportCsvArgs {
    /// Path to JSON input file (same shape as `simulate`)
    #[arg(long)]
    pub input: Option<String>,

    /// Write the CSV here instead of stdout
    #[arg(long)]
    pub out: Option<String>,

    #[command(flatten)]
    pub flags: SimulationFlags,
}

pub fn run_export_csv(args: ExportCsvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: StrategyAnalysisInput = input::read_input(args.input.as_deref(), "CSV export")?;
    args.flags.apply(&mut request);
    let result = simulate_with_config(&request.strategy, &request.market, request.mode, &request.config)?;

    match args.out {
        Some(path) => {
            let file = File::create(&path).map_err(|e| format!("Failed to create '{path}': {e}"))?;
            write_csv(&result, BufWriter::new(file))?;
            // Re-derive the headline figures from what landed on disk
            let rows = parse_csv(&fs::read_to_string(&path)?)?;
            Ok(json!({
                "result": {
                    "path": path,
                    "summary": summarize_rows(&rows),
                }
            }))
        }
        None => {
            write_csv(&result, io::stdout().lock())?;
            Ok(Value::Null)
        }
    }
}

use clap::Args;
use serde_json::Value;
use std::time::Instant;

use optionlab_core::compute_greeks;
use optionlab_core::pricing::black_scholes::{price_option, OptionPricingInput};
use optionlab_core::pricing::implied_vol::{implied_volatility, ImpliedVolInput};
use optionlab_core::types::with_metadata;

use crate::input;

/// Arguments for option pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: OptionPricingInput = input::read_input(args.input.as_deref(), "option pricing")?;
    let result = price_option(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for single-option Greeks
#[derive(Args)]
pub struct GreeksArgs {
    /// Path to JSON input file (same shape as `price`)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_greeks(args: GreeksArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let g: OptionPricingInput = input::read_input(args.input.as_deref(), "greeks")?;
    let greeks = compute_greeks(
        g.option_type,
        g.spot_price,
        g.strike_price,
        g.risk_free_rate,
        g.dividend_yield,
        g.volatility,
        g.time_to_expiry,
    );
    let assumptions = serde_json::json!({
        "theta": "per calendar day",
        "vega": "per 1 volatility point",
        "rho": "per 1 rate point",
    });
    let output = with_metadata(
        "Black-Scholes-Merton analytic Greeks",
        &assumptions,
        vec![],
        start.elapsed().as_micros() as u64,
        greeks,
    );
    Ok(serde_json::to_value(output)?)
}

/// Arguments for implied volatility
#[derive(Args)]
pub struct ImpliedVolArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_implied_vol(args: ImpliedVolArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let iv_input: ImpliedVolInput = input::read_input(args.input.as_deref(), "implied vol")?;
    let result = implied_volatility(&iv_input)?;
    Ok(serde_json::to_value(result)?)
}

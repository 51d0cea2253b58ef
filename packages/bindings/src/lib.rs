use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use optionlab_core::export::csv::to_csv_string;
use optionlab_core::pricing::black_scholes::{price_option, OptionPricingInput};
use optionlab_core::pricing::implied_vol::{implied_volatility as solve_implied_vol, ImpliedVolInput};
use optionlab_core::simulation::simulator::{analyze_strategy, StrategyAnalysisInput};
use optionlab_core::strategy::presets::{build_preset as build_preset_strategy, PresetParams};
use optionlab_core::strategy::validation::{has_blocking_issues, validate_market};
use optionlab_core::{MarketParameters, Strategy};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_option_price(input_json: String) -> NapiResult<String> {
    let input: OptionPricingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = price_option(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_greeks(input_json: String) -> NapiResult<String> {
    let input: OptionPricingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let greeks = optionlab_core::compute_greeks(
        input.option_type,
        input.spot_price,
        input.strike_price,
        input.risk_free_rate,
        input.dividend_yield,
        input.volatility,
        input.time_to_expiry,
    );
    serde_json::to_string(&greeks).map_err(to_napi_error)
}

#[napi]
pub fn implied_volatility(input_json: String) -> NapiResult<String> {
    let input: ImpliedVolInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solve_implied_vol(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValidateRequest {
    strategy: Strategy,
    #[serde(default)]
    market: Option<MarketParameters>,
}

#[napi]
pub fn validate_strategy(input_json: String) -> NapiResult<String> {
    let request: ValidateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let mut issues = optionlab_core::validate_strategy(&request.strategy);
    if let Some(market) = &request.market {
        issues.extend(validate_market(market));
    }
    let output = serde_json::json!({
        "valid": !has_blocking_issues(&issues),
        "issues": issues,
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_strategy(input_json: String) -> NapiResult<String> {
    let input: StrategyAnalysisInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analyze_strategy(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Simulates and returns the price grid in the CSV export format.
#[napi]
pub fn export_csv(input_json: String) -> NapiResult<String> {
    let input: StrategyAnalysisInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = optionlab_core::simulate_with_config(&input.strategy, &input.market, input.mode, &input.config)
        .map_err(to_napi_error)?;
    to_csv_string(&result).map_err(to_napi_error)
}

#[napi]
pub fn build_preset(input_json: String) -> NapiResult<String> {
    let params: PresetParams = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let strategy = build_preset_strategy(&params).map_err(to_napi_error)?;
    serde_json::to_string(&strategy).map_err(to_napi_error)
}

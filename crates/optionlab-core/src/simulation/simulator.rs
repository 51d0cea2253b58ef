use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::OptionLabError;
use crate::pricing::black_scholes::MIN_VOLATILITY;
use crate::pricing::greeks::OptionGreeks;
use crate::simulation::breakeven::find_breakevens;
use crate::simulation::grid::{base_range, build_grid, widen_range, SimulationConfig};
use crate::simulation::payoff::{net_premium, LegBreakdown, PayoffCurve};
use crate::simulation::risk::{risk_profile, RiskBound};
use crate::strategy::leg::{EvaluationMode, MarketParameters, Strategy};
use crate::strategy::validation::{has_blocking_issues, validate_market, validate_strategy};
use crate::types::*;
use crate::OptionLabResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskWarning {
    UnboundedProfit,
    UnboundedLoss,
}

impl RiskWarning {
    pub fn message(&self) -> &'static str {
        match self {
            RiskWarning::UnboundedProfit => "Profit is unbounded as the underlying rises",
            RiskWarning::UnboundedLoss => "Loss is unbounded as the underlying rises",
        }
    }
}

/// One row of the chart grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Money,
    pub pl: Money,
    pub pl_percent: Option<Decimal>,
    pub greeks: OptionGreeks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlResult {
    pub mode: EvaluationMode,
    /// Positive = net credit received, negative = net debit paid.
    pub net_premium: Money,
    pub evaluation_price: Money,
    pub total_pl: Money,
    /// `None` when the net premium is zero.
    pub total_pl_percent: Option<Decimal>,
    pub per_leg: Vec<LegBreakdown>,
    pub greeks_aggregate: OptionGreeks,
    /// Zero crossings of the at-expiration curve, ascending.
    pub breakevens: Vec<Money>,
    pub max_profit: RiskBound,
    /// Positive magnitude.
    pub max_loss: RiskBound,
    /// max profit / max loss, when both are bounded and the loss is non-zero.
    pub risk_reward_ratio: Option<Decimal>,
    /// Share of grid points with positive P/L.
    pub profit_probability_estimate: Decimal,
    pub price_grid: Vec<PricePoint>,
    pub warnings: Vec<RiskWarning>,
}

/// Serialisable request for [`analyze_strategy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAnalysisInput {
    pub strategy: Strategy,
    pub market: MarketParameters,
    #[serde(default)]
    pub mode: EvaluationMode,
    #[serde(default)]
    pub config: SimulationConfig,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// P/L as a percentage of the capital at risk at entry.
pub fn pl_percent(pl: Money, net_premium: Money) -> Option<Decimal> {
    if net_premium.is_zero() {
        None
    } else {
        Some(pl / net_premium.abs() * dec!(100))
    }
}

/// Simulate with the default grid and range settings.
pub fn simulate_strategy(
    strategy: &Strategy,
    market: &MarketParameters,
    mode: EvaluationMode,
) -> OptionLabResult<PlResult> {
    simulate_with_config(strategy, market, mode, &SimulationConfig::default())
}

/// Full P/L simulation of a strategy.
///
/// Validation runs first and any blocking issue aborts before pricing.
/// Breakevens and max profit/loss always come from the at-expiration curve;
/// the grid, per-leg breakdown and Greeks follow `mode`.
pub fn simulate_with_config(
    strategy: &Strategy,
    market: &MarketParameters,
    mode: EvaluationMode,
    config: &SimulationConfig,
) -> OptionLabResult<PlResult> {
    let mut issues = validate_strategy(strategy);
    issues.extend(validate_market(market));
    if has_blocking_issues(&issues) {
        debug!(issues = issues.len(), "strategy rejected before pricing");
        return Err(OptionLabError::InvalidStrategy(issues));
    }
    config.validate()?;

    let expiry = PayoffCurve::new(strategy, market, EvaluationMode::AtExpiration);
    let curve = PayoffCurve::new(strategy, market, mode);

    let base = base_range(strategy, market, config);
    let highest_strike = strategy.strikes().last().copied().unwrap_or(Decimal::ZERO);
    let search_upper = base
        .upper
        .max(highest_strike * Decimal::TWO)
        .max(strategy.underlying_price_at_entry * Decimal::TWO);

    let breakevens = find_breakevens(&expiry, search_upper);
    let risk = risk_profile(&expiry, search_upper);

    let evaluation_price = market.current_underlying_price;
    let mut key_prices = strategy.strikes();
    key_prices.extend(breakevens.iter().copied());
    key_prices.push(evaluation_price);

    let range = widen_range(base, &key_prices);
    let grid = build_grid(range, config.grid_points, &key_prices);

    let net = net_premium(&strategy.legs);
    let price_grid: Vec<PricePoint> = grid
        .into_iter()
        .map(|price| {
            let (pl, greeks) = curve.pl_and_greeks_at(price);
            PricePoint {
                price,
                pl,
                pl_percent: pl_percent(pl, net),
                greeks,
            }
        })
        .collect();

    let per_leg = curve.breakdown_at(evaluation_price);
    let total_pl: Money = per_leg.iter().map(|l| l.pl).sum();
    let greeks_aggregate: OptionGreeks = per_leg.iter().map(|l| l.greeks).sum();

    let mut warnings = Vec::new();
    if risk.max_profit.is_unbounded() {
        warnings.push(RiskWarning::UnboundedProfit);
    }
    if risk.max_loss.is_unbounded() {
        warn!(strategy = %strategy.name, "strategy carries unbounded loss");
        warnings.push(RiskWarning::UnboundedLoss);
    }

    let risk_reward_ratio = match (risk.max_profit, risk.max_loss) {
        (RiskBound::Bounded(profit), RiskBound::Bounded(loss)) if loss > Decimal::ZERO => {
            Some(profit / loss)
        }
        _ => None,
    };

    let winners = price_grid.iter().filter(|p| p.pl > Decimal::ZERO).count();
    let profit_probability_estimate = if price_grid.is_empty() {
        Decimal::ZERO
    } else {
        (Decimal::from(winners) / Decimal::from(price_grid.len())).round_dp(4)
    };

    debug!(
        strategy = %strategy.name,
        ?mode,
        points = price_grid.len(),
        breakevens = breakevens.len(),
        "simulation complete"
    );

    Ok(PlResult {
        mode,
        net_premium: net,
        evaluation_price,
        total_pl,
        total_pl_percent: pl_percent(total_pl, net),
        per_leg,
        greeks_aggregate,
        breakevens,
        max_profit: risk.max_profit,
        max_loss: risk.max_loss,
        risk_reward_ratio,
        profit_probability_estimate,
        price_grid,
        warnings,
    })
}

/// [`simulate_with_config`] wrapped in the standard computation envelope.
/// Non-blocking validation issues and risk warnings become envelope warnings.
pub fn analyze_strategy(
    input: &StrategyAnalysisInput,
) -> OptionLabResult<ComputationOutput<PlResult>> {
    let start = Instant::now();
    let result = simulate_with_config(&input.strategy, &input.market, input.mode, &input.config)?;

    let mut warnings: Vec<String> = validate_strategy(&input.strategy)
        .into_iter()
        .chain(validate_market(&input.market))
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect();
    warnings.extend(result.warnings.iter().map(|w| w.message().to_string()));

    let assumptions = serde_json::json!({
        "model": "Black-Scholes-Merton, flat volatility, continuous dividend yield",
        "mode": input.mode,
        "volatility": input.market.volatility.max(MIN_VOLATILITY).to_string(),
        "risk_free_rate": input.market.risk_free_rate.to_string(),
        "dividend_yield": input.market.dividend_yield.to_string(),
        "elapsed_time": input.market.elapsed_time.to_string(),
        "grid_points": input.config.grid_points,
        "expected_move_multiple": input.config.expected_move_multiple.to_string(),
        "theta": "per calendar day",
        "vega_rho": "per 1 percentage point",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Options strategy P/L simulation",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

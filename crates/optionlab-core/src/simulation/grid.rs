use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::OptionLabError;
use crate::math::sqrt_decimal;
use crate::pricing::black_scholes::effective_volatility;
use crate::strategy::leg::{MarketParameters, Strategy};
use crate::types::*;
use crate::OptionLabResult;

pub const DEFAULT_GRID_POINTS: u32 = 201;
pub const MAX_GRID_POINTS: u32 = 10_000;
pub const DEFAULT_EXPECTED_MOVE_MULTIPLE: Decimal = dec!(3);

/// Room left around strikes, breakevens and the evaluation price.
const RANGE_MARGIN: Decimal = dec!(0.05);
/// Floor on the half-width, as a fraction of the centre, once time or
/// volatility has collapsed the expected move.
const MIN_HALF_WIDTH: Decimal = dec!(0.05);
const GRID_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower: Money,
    pub upper: Money,
}

/// Tunables for a simulation run. Every field has a default, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Evenly spaced prices on the chart grid, before strikes and
    /// breakevens are inserted.
    pub grid_points: u32,
    /// Half-width of the automatic range in standard deviations of the
    /// terminal price.
    pub expected_move_multiple: Decimal,
    /// Replaces the automatic range; still widened to cover key prices.
    pub price_range: Option<PriceRange>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_points: DEFAULT_GRID_POINTS,
            expected_move_multiple: DEFAULT_EXPECTED_MOVE_MULTIPLE,
            price_range: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> OptionLabResult<()> {
        if !(2..=MAX_GRID_POINTS).contains(&self.grid_points) {
            return Err(OptionLabError::InvalidInput {
                field: "grid_points".into(),
                reason: format!("must be between 2 and {MAX_GRID_POINTS}"),
            });
        }
        if self.expected_move_multiple <= Decimal::ZERO {
            return Err(OptionLabError::InvalidInput {
                field: "expected_move_multiple".into(),
                reason: "must be positive".into(),
            });
        }
        if let Some(range) = self.price_range {
            if range.lower < Decimal::ZERO || range.upper <= range.lower {
                return Err(OptionLabError::InvalidInput {
                    field: "price_range".into(),
                    reason: "requires 0 <= lower < upper".into(),
                });
            }
        }
        Ok(())
    }
}

/// Range before widening: the caller's override, or the entry price plus or
/// minus `expected_move_multiple * sigma * sqrt(T_max)` of itself.
pub fn base_range(strategy: &Strategy, market: &MarketParameters, config: &SimulationConfig) -> PriceRange {
    if let Some(range) = config.price_range {
        return range;
    }
    let centre = strategy.underlying_price_at_entry;
    let sigma = effective_volatility(market.volatility);
    let spread = config.expected_move_multiple * sigma * sqrt_decimal(strategy.max_expiration());
    let half = (spread * centre).max(MIN_HALF_WIDTH * centre);
    PriceRange {
        lower: (centre - half).max(Decimal::ZERO),
        upper: centre + half,
    }
}

/// Stretch `range` so every key price sits inside it with a 5% margin.
pub fn widen_range(range: PriceRange, key_prices: &[Money]) -> PriceRange {
    let mut lower = range.lower;
    let mut upper = range.upper;
    for &p in key_prices {
        lower = lower.min(p * (Decimal::ONE - RANGE_MARGIN));
        upper = upper.max(p * (Decimal::ONE + RANGE_MARGIN));
    }
    PriceRange {
        lower: lower.max(Decimal::ZERO),
        upper,
    }
}

/// `points` evenly spaced prices over `range` plus every in-range key price,
/// sorted and de-duplicated.
pub fn build_grid(range: PriceRange, points: u32, key_prices: &[Money]) -> Vec<Money> {
    let n = points.max(2);
    let step = (range.upper - range.lower) / Decimal::from(n - 1);

    let mut grid: Vec<Money> = (0..n - 1)
        .map(|i| (range.lower + step * Decimal::from(i)).round_dp(GRID_DECIMALS))
        .collect();
    grid.push(range.upper);
    grid.extend(
        key_prices
            .iter()
            .copied()
            .filter(|p| *p >= range.lower && *p <= range.upper),
    );
    grid.sort();
    grid.dedup();
    grid
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

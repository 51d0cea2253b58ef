use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::OptionLabError;
use crate::pricing::black_scholes::{bs_terms, black_scholes_price, intrinsic_value};
use crate::strategy::leg::OptionType;
use crate::types::*;
use crate::OptionLabResult;

const MAX_ITERATIONS: u32 = 100;
const PRICE_TOLERANCE: Decimal = dec!(0.000001);
const INITIAL_VOL: Decimal = dec!(0.20);
const VOL_LOWER_BOUND: Decimal = dec!(0.001);
const VOL_UPPER_BOUND: Decimal = dec!(5.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedVolInput {
    pub spot_price: Money,
    pub strike_price: Money,
    pub time_to_expiry: Years,
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    pub option_type: OptionType,
    pub market_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedVolOutput {
    pub implied_vol: Rate,
    pub iterations: u32,
}

fn validate_iv_input(input: &ImpliedVolInput) -> OptionLabResult<()> {
    let positive = [
        ("spot_price", input.spot_price),
        ("strike_price", input.strike_price),
        ("time_to_expiry", input.time_to_expiry),
        ("market_price", input.market_price),
    ];
    for (field, value) in positive {
        if value <= Decimal::ZERO {
            return Err(OptionLabError::InvalidInput {
                field: field.into(),
                reason: "must be positive".into(),
            });
        }
    }
    let floor = intrinsic_value(input.option_type, input.spot_price, input.strike_price);
    if input.market_price < floor {
        return Err(OptionLabError::InvalidInput {
            field: "market_price".into(),
            reason: format!("below intrinsic value {floor}; no volatility reproduces it"),
        });
    }
    Ok(())
}

/// Newton-Raphson inversion of Black-Scholes-Merton for the flat volatility
/// that reproduces `market_price`.
pub fn implied_volatility(
    input: &ImpliedVolInput,
) -> OptionLabResult<ComputationOutput<ImpliedVolOutput>> {
    let start = Instant::now();
    validate_iv_input(input)?;

    let s = input.spot_price;
    let k = input.strike_price;
    let t = input.time_to_expiry;
    let r = input.risk_free_rate;
    let q = input.dividend_yield;
    let target = input.market_price;

    let mut sigma = INITIAL_VOL;
    let mut iterations: u32 = 0;
    let mut last_delta = Decimal::ZERO;

    for i in 0..MAX_ITERATIONS {
        iterations = i + 1;
        let price = black_scholes_price(input.option_type, s, k, r, q, sigma, t);
        let diff = price - target;
        last_delta = diff.abs();

        if last_delta < PRICE_TOLERANCE {
            break;
        }

        // Raw dV/dsigma, not the per-point vega reported by the Greeks
        let terms = bs_terms(s, k, r, q, sigma, t);
        let vega_raw = s * terms.exp_neg_qt * terms.pdf_d1 * terms.sqrt_t;

        if vega_raw <= dec!(0.0000001) {
            debug!(iterations, %sigma, "implied vol: vega vanished");
            return Err(OptionLabError::ConvergenceFailure {
                function: "implied_volatility".into(),
                iterations,
                last_delta,
            });
        }

        sigma = (sigma - diff / vega_raw).clamp(VOL_LOWER_BOUND, VOL_UPPER_BOUND);
    }

    if last_delta >= PRICE_TOLERANCE {
        return Err(OptionLabError::ConvergenceFailure {
            function: "implied_volatility".into(),
            iterations,
            last_delta,
        });
    }

    debug!(iterations, %sigma, "implied vol converged");

    let output = ImpliedVolOutput {
        implied_vol: sigma,
        iterations,
    };

    let assumptions = serde_json::json!({
        "model": "Newton-Raphson on Black-Scholes-Merton",
        "initial_vol": INITIAL_VOL.to_string(),
        "max_iterations": MAX_ITERATIONS,
        "tolerance": PRICE_TOLERANCE.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Newton-Raphson implied volatility",
        &assumptions,
        vec![],
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

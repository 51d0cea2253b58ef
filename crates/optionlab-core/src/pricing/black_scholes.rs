use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::OptionLabError;
use crate::math::{exp_decimal, ln_decimal, norm_cdf, norm_pdf, sqrt_decimal};
use crate::pricing::greeks::{compute_greeks, OptionGreeks};
use crate::strategy::leg::OptionType;
use crate::types::*;
use crate::OptionLabResult;

/// Volatility floor. Inputs at or below zero are priced at this level
/// instead of producing a division by zero in d1.
pub const MIN_VOLATILITY: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingInput {
    pub spot_price: Money,
    pub strike_price: Money,
    pub time_to_expiry: Years,
    pub risk_free_rate: Rate,
    pub volatility: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    pub option_type: OptionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingOutput {
    pub price: Money,
    pub intrinsic_value: Money,
    pub time_value: Money,
    pub greeks: OptionGreeks,
    pub put_call_parity_price: Money,
    pub moneyness: String,
    pub breakeven: Money,
    pub effective_volatility: Rate,
}

// ---------------------------------------------------------------------------
// Black-Scholes-Merton internals
// ---------------------------------------------------------------------------

/// Intermediate terms shared by the price and every Greek.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BsTerms {
    pub nd1: Decimal,
    pub nd2: Decimal,
    pub pdf_d1: Decimal,
    pub sqrt_t: Decimal,
    pub sigma_sqrt_t: Decimal,
    pub exp_neg_qt: Decimal,
    pub exp_neg_rt: Decimal,
}

pub(crate) fn effective_volatility(sigma: Rate) -> Rate {
    if sigma < MIN_VOLATILITY {
        MIN_VOLATILITY
    } else {
        sigma
    }
}

/// Requires s > 0, k > 0, t > 0. Volatility is clamped here.
pub(crate) fn bs_terms(s: Money, k: Money, r: Rate, q: Rate, sigma: Rate, t: Years) -> BsTerms {
    let sigma = effective_volatility(sigma);
    let sqrt_t = sqrt_decimal(t);
    let sigma_sqrt_t = sigma * sqrt_t;
    let d1 = (ln_decimal(s / k) + (r - q + sigma * sigma / dec!(2)) * t) / sigma_sqrt_t;
    let d2 = d1 - sigma_sqrt_t;
    BsTerms {
        nd1: norm_cdf(d1),
        nd2: norm_cdf(d2),
        pdf_d1: norm_pdf(d1),
        sqrt_t,
        sigma_sqrt_t,
        exp_neg_qt: exp_decimal(-q * t),
        exp_neg_rt: exp_decimal(-r * t),
    }
}

/// Payoff if exercised now.
pub fn intrinsic_value(option_type: OptionType, s: Money, k: Money) -> Money {
    match option_type {
        OptionType::Call => (s - k).max(Decimal::ZERO),
        OptionType::Put => (k - s).max(Decimal::ZERO),
    }
}

/// European option value under Black-Scholes-Merton with continuous dividend yield.
///
/// Total over its inputs:
/// - `t <= 0` returns intrinsic value;
/// - `sigma <= MIN_VOLATILITY` is priced at `MIN_VOLATILITY`;
/// - `s <= 0` returns the S -> 0 limit (call 0, put K*e^(-rT));
/// - `k <= 0` returns the K -> 0 limit (call S*e^(-qT) - K*e^(-rT), put 0).
///
/// The put is derived from the call through put-call parity, so
/// `call - put == S*e^(-qT) - K*e^(-rT)` up to Decimal rounding.
pub fn black_scholes_price(
    option_type: OptionType,
    s: Money,
    k: Money,
    r: Rate,
    q: Rate,
    sigma: Rate,
    t: Years,
) -> Money {
    if t <= Decimal::ZERO {
        return intrinsic_value(option_type, s, k);
    }

    if s > Decimal::ZERO && k > Decimal::ZERO {
        return price_from_terms(option_type, s, k, &bs_terms(s, k, r, q, sigma, t));
    }

    let exp_neg_qt = exp_decimal(-q * t);
    let exp_neg_rt = exp_decimal(-r * t);
    let forward_leg = s.max(Decimal::ZERO) * exp_neg_qt;
    let strike_leg = k * exp_neg_rt;

    match option_type {
        OptionType::Call if s <= Decimal::ZERO => Decimal::ZERO,
        OptionType::Call => forward_leg - strike_leg,
        OptionType::Put if k <= Decimal::ZERO => Decimal::ZERO,
        OptionType::Put => strike_leg - forward_leg,
    }
}

/// Price for s > 0, k > 0, t > 0 from precomputed terms; the put goes through parity.
pub(crate) fn price_from_terms(option_type: OptionType, s: Money, k: Money, terms: &BsTerms) -> Money {
    let forward_leg = s * terms.exp_neg_qt;
    let strike_leg = k * terms.exp_neg_rt;
    let call = forward_leg * terms.nd1 - strike_leg * terms.nd2;
    match option_type {
        OptionType::Call => call,
        OptionType::Put => call - forward_leg + strike_leg,
    }
}

/// Library entry point used by the UI layer; same contract as [`black_scholes_price`].
pub fn compute_option_price(
    option_type: OptionType,
    s: Money,
    k: Money,
    r: Rate,
    q: Rate,
    sigma: Rate,
    t: Years,
) -> Money {
    black_scholes_price(option_type, s, k, r, q, sigma, t)
}

// ---------------------------------------------------------------------------
// Moneyness helpers
// ---------------------------------------------------------------------------

fn classify_moneyness(s: Decimal, k: Decimal, option_type: OptionType) -> String {
    let ratio = s / k;
    // ATM band: within 1% of strike
    let atm_lo = dec!(0.99);
    let atm_hi = dec!(1.01);
    let in_band = ratio >= atm_lo && ratio <= atm_hi;
    if in_band {
        return "ATM".into();
    }
    let itm = match option_type {
        OptionType::Call => ratio > atm_hi,
        OptionType::Put => ratio < atm_lo,
    };
    if itm {
        "ITM".into()
    } else {
        "OTM".into()
    }
}

fn single_option_breakeven(k: Decimal, premium: Decimal, option_type: OptionType) -> Decimal {
    match option_type {
        OptionType::Call => k + premium,
        OptionType::Put => k - premium,
    }
}

fn validate_pricing_input(input: &OptionPricingInput) -> OptionLabResult<()> {
    if input.spot_price <= Decimal::ZERO {
        return Err(OptionLabError::InvalidInput {
            field: "spot_price".into(),
            reason: "must be positive".into(),
        });
    }
    if input.strike_price <= Decimal::ZERO {
        return Err(OptionLabError::InvalidInput {
            field: "strike_price".into(),
            reason: "must be positive".into(),
        });
    }
    if input.time_to_expiry < Decimal::ZERO {
        return Err(OptionLabError::InvalidInput {
            field: "time_to_expiry".into(),
            reason: "must not be negative".into(),
        });
    }
    if input.dividend_yield < Decimal::ZERO {
        return Err(OptionLabError::InvalidInput {
            field: "dividend_yield".into(),
            reason: "must not be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API: price_option
// ---------------------------------------------------------------------------

pub fn price_option(
    input: &OptionPricingInput,
) -> OptionLabResult<ComputationOutput<OptionPricingOutput>> {
    let start = Instant::now();
    validate_pricing_input(input)?;

    let s = input.spot_price;
    let k = input.strike_price;
    let t = input.time_to_expiry;
    let r = input.risk_free_rate;
    let q = input.dividend_yield;
    let sigma = input.volatility;

    let mut warnings = Vec::new();
    if sigma < MIN_VOLATILITY {
        warnings.push(format!(
            "Volatility {sigma} is below the {MIN_VOLATILITY} floor; priced at the floor"
        ));
    }
    if t.is_zero() {
        warnings.push("Option is at expiry; value equals intrinsic value".to_string());
    }

    let price = black_scholes_price(input.option_type, s, k, r, q, sigma, t);
    let greeks = compute_greeks(input.option_type, s, k, r, q, sigma, t);

    let counterpart = match input.option_type {
        OptionType::Call => OptionType::Put,
        OptionType::Put => OptionType::Call,
    };
    let put_call_parity_price = black_scholes_price(counterpart, s, k, r, q, sigma, t);

    let iv = intrinsic_value(input.option_type, s, k);
    let output = OptionPricingOutput {
        price,
        intrinsic_value: iv,
        time_value: price - iv,
        greeks,
        put_call_parity_price,
        moneyness: classify_moneyness(s, k, input.option_type),
        breakeven: single_option_breakeven(k, price, input.option_type),
        effective_volatility: effective_volatility(sigma),
    };

    let assumptions = serde_json::json!({
        "model": "Black-Scholes-Merton (European, continuous dividend yield)",
        "risk_free_rate": r.to_string(),
        "volatility": sigma.to_string(),
        "dividend_yield": q.to_string(),
        "theta_convention": "per calendar day",
        "vega_convention": "per 1 volatility point",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Black-Scholes-Merton (closed-form)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

use crate::math::exp_decimal;
use crate::pricing::black_scholes::{black_scholes_price, bs_terms, price_from_terms, BsTerms};
use crate::strategy::leg::{MarketParameters, OptionLeg, OptionType};
use crate::types::*;

const DAYS_PER_YEAR: Decimal = dec!(365);
const PERCENT: Decimal = dec!(100);

/// First and second order sensitivities.
///
/// Conventions: theta is per calendar day (annual / 365), vega per one
/// volatility point (0.01), rho per one rate point (0.01).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionGreeks {
    pub delta: Decimal,
    pub gamma: Decimal,
    pub theta: Decimal,
    pub vega: Decimal,
    pub rho: Decimal,
}

impl OptionGreeks {
    pub fn scale(self, factor: Decimal) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
        }
    }
}

impl Add for OptionGreeks {
    type Output = OptionGreeks;

    fn add(self, other: OptionGreeks) -> OptionGreeks {
        OptionGreeks {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
        }
    }
}

impl Sum for OptionGreeks {
    fn sum<I: Iterator<Item = OptionGreeks>>(iter: I) -> Self {
        iter.fold(OptionGreeks::default(), |acc, g| acc + g)
    }
}

/// Step-function delta of an expired option; every other Greek is zero.
fn expiry_greeks(option_type: OptionType, s: Money, k: Money) -> OptionGreeks {
    let delta = match option_type {
        OptionType::Call if s > k => Decimal::ONE,
        OptionType::Put if s < k => Decimal::NEGATIVE_ONE,
        _ => Decimal::ZERO,
    };
    OptionGreeks {
        delta,
        ..OptionGreeks::default()
    }
}

/// Analytic Black-Scholes-Merton Greeks for one option (per share, long).
///
/// Mirrors the guards of [`crate::pricing::black_scholes::black_scholes_price`]:
/// expired options use the step-function delta, non-positive spot or strike
/// use the corresponding limits, and volatility is floored.
pub fn compute_greeks(
    option_type: OptionType,
    s: Money,
    k: Money,
    r: Rate,
    q: Rate,
    sigma: Rate,
    t: Years,
) -> OptionGreeks {
    if t <= Decimal::ZERO {
        return expiry_greeks(option_type, s, k);
    }

    let exp_neg_qt = exp_decimal(-q * t);
    let exp_neg_rt = exp_decimal(-r * t);

    // S -> 0: call is worthless, put is a discounted strike.
    if s <= Decimal::ZERO {
        return match option_type {
            OptionType::Call => OptionGreeks::default(),
            OptionType::Put => OptionGreeks {
                delta: -exp_neg_qt,
                gamma: Decimal::ZERO,
                theta: r * k * exp_neg_rt / DAYS_PER_YEAR,
                vega: Decimal::ZERO,
                rho: -k * t * exp_neg_rt / PERCENT,
            },
        };
    }

    // K -> 0: call is a dividend-adjusted forward, put is worthless.
    if k <= Decimal::ZERO {
        return match option_type {
            OptionType::Call => OptionGreeks {
                delta: exp_neg_qt,
                gamma: Decimal::ZERO,
                theta: (q * s * exp_neg_qt - r * k * exp_neg_rt) / DAYS_PER_YEAR,
                vega: Decimal::ZERO,
                rho: k * t * exp_neg_rt / PERCENT,
            },
            OptionType::Put => OptionGreeks::default(),
        };
    }

    greeks_from_terms(option_type, s, k, r, q, t, &bs_terms(s, k, r, q, sigma, t))
}

/// Greeks for s > 0, k > 0, t > 0 from precomputed terms.
fn greeks_from_terms(
    option_type: OptionType,
    s: Money,
    k: Money,
    r: Rate,
    q: Rate,
    t: Years,
    terms: &BsTerms,
) -> OptionGreeks {
    let n_neg_d1 = Decimal::ONE - terms.nd1;
    let n_neg_d2 = Decimal::ONE - terms.nd2;

    let delta = match option_type {
        OptionType::Call => terms.exp_neg_qt * terms.nd1,
        OptionType::Put => terms.exp_neg_qt * (terms.nd1 - Decimal::ONE),
    };

    // gamma = e^(-qT) * phi(d1) / (S * sigma * sqrt(T))
    let gamma = terms.exp_neg_qt * terms.pdf_d1 / (s * terms.sigma_sqrt_t);

    // -S e^(-qT) phi(d1) sigma / (2 sqrt(T)), written with sigma*sqrt(T) / (2T)
    let decay = -s * terms.exp_neg_qt * terms.pdf_d1 * terms.sigma_sqrt_t / (dec!(2) * t);
    let theta_annual = match option_type {
        OptionType::Call => {
            decay - r * k * terms.exp_neg_rt * terms.nd2 + q * s * terms.exp_neg_qt * terms.nd1
        }
        OptionType::Put => {
            decay + r * k * terms.exp_neg_rt * n_neg_d2 - q * s * terms.exp_neg_qt * n_neg_d1
        }
    };

    let vega = s * terms.exp_neg_qt * terms.pdf_d1 * terms.sqrt_t / PERCENT;

    let rho = match option_type {
        OptionType::Call => k * t * terms.exp_neg_rt * terms.nd2 / PERCENT,
        OptionType::Put => -k * t * terms.exp_neg_rt * n_neg_d2 / PERCENT,
    };

    OptionGreeks {
        delta,
        gamma,
        theta: theta_annual / DAYS_PER_YEAR,
        vega,
        rho,
    }
}

/// Value and Greeks of one option (per share, long), sharing a single set of
/// Black-Scholes terms. Matches [`black_scholes_price`] and [`compute_greeks`].
pub fn price_with_greeks(
    option_type: OptionType,
    s: Money,
    k: Money,
    r: Rate,
    q: Rate,
    sigma: Rate,
    t: Years,
) -> (Money, OptionGreeks) {
    if t <= Decimal::ZERO || s <= Decimal::ZERO || k <= Decimal::ZERO {
        return (
            black_scholes_price(option_type, s, k, r, q, sigma, t),
            compute_greeks(option_type, s, k, r, q, sigma, t),
        );
    }
    let terms = bs_terms(s, k, r, q, sigma, t);
    (
        price_from_terms(option_type, s, k, &terms),
        greeks_from_terms(option_type, s, k, r, q, t, &terms),
    )
}

/// Position Greeks of one leg at `price` with `remaining_t` years left:
/// sign-adjusted by direction and scaled by quantity * contract multiplier.
pub fn leg_greeks(
    leg: &OptionLeg,
    market: &MarketParameters,
    price: Money,
    remaining_t: Years,
) -> OptionGreeks {
    compute_greeks(
        leg.option_type,
        price,
        leg.strike,
        market.risk_free_rate,
        market.dividend_yield,
        market.volatility,
        remaining_t,
    )
    .scale(leg.position_scale())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

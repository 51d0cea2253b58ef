//! Property-based tests using proptest
//!
//! Invariants of the pricing engine and payoff curves over random inputs.

use optionlab_core::math::exp_decimal;
use optionlab_core::simulation::payoff::PayoffCurve;
use optionlab_core::{
    compute_greeks, compute_option_price, Direction, EvaluationMode, MarketParameters, OptionLeg,
    OptionType, Strategy as OptionStrategy,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Random market inputs as (spot, strike, rate, dividend yield, volatility, time).
fn market_inputs() -> impl Strategy<Value = (Decimal, Decimal, Decimal, Decimal, Decimal, Decimal)> {
    (
        1_000i64..50_000,
        1_000i64..50_000,
        0i64..1_000,
        0i64..500,
        500i64..15_000,
        1i64..3_000,
    )
        .prop_map(|(s, k, r, q, sigma, t)| {
            (
                Decimal::new(s, 2),
                Decimal::new(k, 2),
                Decimal::new(r, 4),
                Decimal::new(q, 4),
                Decimal::new(sigma, 4),
                Decimal::new(t, 3),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn put_call_parity_holds((s, k, r, q, sigma, t) in market_inputs()) {
        let call = compute_option_price(OptionType::Call, s, k, r, q, sigma, t);
        let put = compute_option_price(OptionType::Put, s, k, r, q, sigma, t);
        let forward = s * exp_decimal(-q * t) - k * exp_decimal(-r * t);
        prop_assert!((call - put - forward).abs() < Decimal::new(1, 6));
    }

    #[test]
    fn prices_are_non_negative((s, k, r, q, sigma, t) in market_inputs()) {
        prop_assert!(compute_option_price(OptionType::Call, s, k, r, q, sigma, t) >= Decimal::ZERO);
        prop_assert!(compute_option_price(OptionType::Put, s, k, r, q, sigma, t) >= -Decimal::new(1, 6));
    }

    #[test]
    fn delta_within_bounds((s, k, r, q, sigma, t) in market_inputs()) {
        let call = compute_greeks(OptionType::Call, s, k, r, q, sigma, t);
        let put = compute_greeks(OptionType::Put, s, k, r, q, sigma, t);
        let discount = exp_decimal(-q * t);
        prop_assert!(call.delta >= Decimal::ZERO && call.delta <= discount);
        prop_assert!(put.delta >= -discount && put.delta <= Decimal::ZERO);
    }

    #[test]
    fn gamma_and_vega_match_between_call_and_put((s, k, r, q, sigma, t) in market_inputs()) {
        let call = compute_greeks(OptionType::Call, s, k, r, q, sigma, t);
        let put = compute_greeks(OptionType::Put, s, k, r, q, sigma, t);
        prop_assert_eq!(call.gamma, put.gamma);
        prop_assert_eq!(call.vega, put.vega);
    }

    #[test]
    fn opposite_identical_legs_cancel(
        strike in 50i64..200,
        premium in 0i64..2_000,
        qty in 1i64..10,
        price in 1i64..400,
        is_call in any::<bool>(),
    ) {
        let ty = if is_call { OptionType::Call } else { OptionType::Put };
        let leg = |id: &str, dir| OptionLeg::new(
            id,
            ty,
            dir,
            Decimal::from(strike),
            Decimal::from(qty),
            Decimal::new(premium, 2),
            Decimal::new(25, 2),
        );
        let s = OptionStrategy::new("flat", Decimal::from(100))
            .with_leg(leg("long", Direction::Long))
            .with_leg(leg("short", Direction::Short));
        let m = MarketParameters::new(Decimal::from(100), Decimal::new(3, 1), Decimal::new(4, 2));
        for mode in [EvaluationMode::Today, EvaluationMode::AtExpiration] {
            let curve = PayoffCurve::new(&s, &m, mode);
            let p = Decimal::from(price);
            prop_assert!(curve.pl_at(p).is_zero());
            prop_assert!(curve.greeks_at(p).delta.is_zero());
        }
    }
}

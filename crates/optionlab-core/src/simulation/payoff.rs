use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::math::exp_decimal;
use crate::pricing::black_scholes::black_scholes_price;
use crate::pricing::greeks::{price_with_greeks, OptionGreeks};
use crate::strategy::leg::{EvaluationMode, MarketParameters, OptionLeg, OptionType, Strategy};
use crate::types::*;

/// Samples taken across the search interval when the curve is not piecewise linear.
pub const SAMPLE_COUNT: u32 = 400;

/// One leg's contribution at the evaluation price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegBreakdown {
    pub leg_id: String,
    /// Theoretical value per share.
    pub value: Money,
    /// Cash P/L of the whole position.
    pub pl: Money,
    pub greeks: OptionGreeks,
}

/// Signed cash flow at entry: positive = credit received, negative = debit paid.
pub fn net_premium(legs: &[OptionLeg]) -> Money {
    legs.iter().map(OptionLeg::entry_cash_flow).sum()
}

/// Strategy P/L as a function of the underlying price, for one evaluation mode.
///
/// Each leg is priced with a fixed remaining life:
/// - `Today`: the leg's time to expiration less the market's elapsed time;
/// - `AtExpiration`: the leg's time beyond the nearest expiry, so legs that
///   expire first are worth intrinsic value and longer-dated legs keep their
///   Black-Scholes time value at that date.
#[derive(Debug, Clone)]
pub struct PayoffCurve<'a> {
    legs: &'a [OptionLeg],
    market: &'a MarketParameters,
    times: Vec<Years>,
}

impl<'a> PayoffCurve<'a> {
    pub fn new(strategy: &'a Strategy, market: &'a MarketParameters, mode: EvaluationMode) -> Self {
        let horizon = strategy.min_expiration();
        let times = strategy
            .legs
            .iter()
            .map(|leg| match mode {
                EvaluationMode::Today => market.remaining_time(leg),
                EvaluationMode::AtExpiration => {
                    (leg.time_to_expiration - horizon).max(Decimal::ZERO)
                }
            })
            .collect();
        Self {
            legs: &strategy.legs,
            market,
            times,
        }
    }

    /// True when every leg is valued at intrinsic value, so P/L is linear between strikes.
    pub fn is_piecewise_linear(&self) -> bool {
        self.times.iter().all(|t| t.is_zero())
    }

    pub fn strikes(&self) -> Vec<Money> {
        let mut strikes: Vec<Money> = self.legs.iter().map(|l| l.strike).collect();
        strikes.sort();
        strikes.dedup();
        strikes
    }

    /// Prices at which the curve is inspected for roots and extremes: zero and
    /// every strike when piecewise linear, otherwise an even sample of
    /// `[0, upper]` with the strikes mixed in.
    pub fn inspection_prices(&self, upper: Money) -> Vec<Money> {
        let mut prices = vec![Decimal::ZERO];
        if !self.is_piecewise_linear() {
            let n = Decimal::from(SAMPLE_COUNT);
            prices.extend((1..=SAMPLE_COUNT).map(|i| upper * Decimal::from(i) / n));
        }
        prices.extend(self.strikes().into_iter().filter(|k| *k > Decimal::ZERO));
        prices.sort();
        prices.dedup();
        prices
    }

    fn leg_value(&self, leg: &OptionLeg, t: Years, price: Money) -> Money {
        black_scholes_price(
            leg.option_type,
            price,
            leg.strike,
            self.market.risk_free_rate,
            self.market.dividend_yield,
            self.market.volatility,
            t,
        )
    }

    pub fn pl_at(&self, price: Money) -> Money {
        self.legs
            .iter()
            .zip(&self.times)
            .map(|(leg, &t)| leg.position_scale() * (self.leg_value(leg, t, price) - leg.entry_premium))
            .sum()
    }

    /// Per-share value and position Greeks of one leg, priced once.
    fn leg_quote(&self, leg: &OptionLeg, t: Years, price: Money) -> (Money, OptionGreeks) {
        let (value, greeks) = price_with_greeks(
            leg.option_type,
            price,
            leg.strike,
            self.market.risk_free_rate,
            self.market.dividend_yield,
            self.market.volatility,
            t,
        );
        (value, greeks.scale(leg.position_scale()))
    }

    /// Total P/L and aggregate Greeks at `price`.
    pub fn pl_and_greeks_at(&self, price: Money) -> (Money, OptionGreeks) {
        self.legs
            .iter()
            .zip(&self.times)
            .map(|(leg, &t)| {
                let (value, greeks) = self.leg_quote(leg, t, price);
                (leg.position_scale() * (value - leg.entry_premium), greeks)
            })
            .fold((Decimal::ZERO, OptionGreeks::default()), |(pl, g), (leg_pl, leg_g)| {
                (pl + leg_pl, g + leg_g)
            })
    }

    pub fn greeks_at(&self, price: Money) -> OptionGreeks {
        self.pl_and_greeks_at(price).1
    }

    pub fn breakdown_at(&self, price: Money) -> Vec<LegBreakdown> {
        self.legs
            .iter()
            .zip(&self.times)
            .map(|(leg, &t)| {
                let (value, greeks) = self.leg_quote(leg, t, price);
                LegBreakdown {
                    leg_id: leg.id.clone(),
                    value,
                    pl: leg.position_scale() * (value - leg.entry_premium),
                    greeks,
                }
            })
            .collect()
    }

    /// d(P/L)/dP as P -> infinity. Puts vanish; a call with remaining life
    /// tau behaves like P * e^(-q * tau).
    pub fn right_tail_slope(&self) -> Decimal {
        self.legs
            .iter()
            .zip(&self.times)
            .filter(|(leg, _)| leg.option_type == OptionType::Call)
            .map(|(leg, &t)| leg.position_scale() * exp_decimal(-self.market.dividend_yield * t))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::leg::Direction;
    use rust_decimal_macros::dec;

    fn market() -> MarketParameters {
        MarketParameters::new(dec!(100), dec!(0.25), dec!(0.05))
    }

    fn long_call() -> Strategy {
        Strategy::new("long call", dec!(100)).with_leg(OptionLeg::new(
            "c",
            OptionType::Call,
            Direction::Long,
            dec!(100),
            dec!(1),
            dec!(5),
            dec!(0.5),
        ))
    }

    #[test]
    fn test_expiration_curve_is_intrinsic() {
        let s = long_call();
        let m = market();
        let curve = PayoffCurve::new(&s, &m, EvaluationMode::AtExpiration);
        assert!(curve.is_piecewise_linear());
        assert_eq!(curve.pl_at(dec!(90)), dec!(-500));
        assert_eq!(curve.pl_at(dec!(120)), dec!(1500));
        assert_eq!(curve.right_tail_slope(), dec!(100));
    }

    #[test]
    fn test_today_curve_carries_time_value() {
        let s = long_call();
        let m = market();
        let today = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        let expiry = PayoffCurve::new(&s, &m, EvaluationMode::AtExpiration);
        assert!(!today.is_piecewise_linear());
        assert!(today.pl_at(dec!(100)) > expiry.pl_at(dec!(100)));
    }

    #[test]
    fn test_elapsed_time_moves_today_toward_expiry() {
        let s = long_call();
        let m = market().with_elapsed_time(dec!(0.5));
        let today = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        assert!(today.is_piecewise_linear());
        assert_eq!(today.pl_at(dec!(110)), dec!(500));
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let s = long_call().with_leg(OptionLeg::new(
            "p",
            OptionType::Put,
            Direction::Short,
            dec!(95),
            dec!(2),
            dec!(3),
            dec!(0.5),
        ));
        let m = market();
        let curve = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        let parts = curve.breakdown_at(dec!(101));
        let total: Money = parts.iter().map(|p| p.pl).sum();
        assert_eq!(total, curve.pl_at(dec!(101)));
        let delta: Decimal = parts.iter().map(|p| p.greeks.delta).sum();
        assert_eq!(delta, curve.greeks_at(dec!(101)).delta);
    }

    #[test]
    fn test_inspection_prices() {
        let s = long_call();
        let m = market();
        let expiry = PayoffCurve::new(&s, &m, EvaluationMode::AtExpiration);
        assert_eq!(expiry.inspection_prices(dec!(300)), vec![dec!(0), dec!(100)]);
        let today = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        let sampled = today.inspection_prices(dec!(300));
        // step 0.75 misses the strike, which is added on top of zero and the samples
        assert_eq!(sampled.len(), SAMPLE_COUNT as usize + 2);
        assert!(sampled.contains(&dec!(100)));
        assert_eq!(sampled.last().copied(), Some(dec!(300)));
    }

    #[test]
    fn test_inspection_prices_strike_on_sample_step() {
        let s = long_call();
        let m = market();
        let today = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        let sampled = today.inspection_prices(dec!(400));
        assert_eq!(sampled.len(), SAMPLE_COUNT as usize + 1);
        assert!(sampled.contains(&dec!(100)));
    }

    #[test]
    fn test_pl_and_greeks_match_separate_evaluation() {
        let s = long_call().with_leg(
            OptionLeg::new("far", OptionType::Put, Direction::Short, dec!(95), dec!(3), dec!(4), dec!(1))
                .with_multiplier(dec!(10)),
        );
        let m = market().with_dividend_yield(dec!(0.02));
        for mode in [EvaluationMode::Today, EvaluationMode::AtExpiration] {
            let curve = PayoffCurve::new(&s, &m, mode);
            for price in [dec!(0), dec!(80), dec!(95), dec!(100), dec!(130)] {
                let (pl, greeks) = curve.pl_and_greeks_at(price);
                assert_eq!(pl, curve.pl_at(price));
                let parts = curve.breakdown_at(price);
                let delta: Decimal = parts.iter().map(|p| p.greeks.delta).sum();
                let vega: Decimal = parts.iter().map(|p| p.greeks.vega).sum();
                assert_eq!(greeks.delta, delta);
                assert_eq!(greeks.vega, vega);
            }
        }
    }

    #[test]
    fn test_net_premium_sign() {
        let s = long_call();
        assert_eq!(net_premium(&s.legs), dec!(-500));
    }
}

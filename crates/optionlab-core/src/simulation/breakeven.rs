use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::simulation::payoff::PayoffCurve;
use crate::types::*;

const MAX_BISECTION_ITERATIONS: u32 = 100;
const PRICE_TOLERANCE: Decimal = dec!(0.00000001);
const MAX_TAIL_DOUBLINGS: u32 = 20;

/// Underlying prices where the curve's P/L is zero, ascending.
///
/// A piecewise-linear curve is solved exactly on each segment between
/// consecutive strikes and on the open right tail. Otherwise sign changes
/// between samples of `[0, search_upper]` are refined by bisection, and the
/// tail beyond `search_upper` is bracketed by doubling. Stretches where the
/// P/L is identically zero report no breakeven.
pub fn find_breakevens(curve: &PayoffCurve, search_upper: Money) -> Vec<Money> {
    let prices = curve.inspection_prices(search_upper);
    let values: Vec<Money> = prices.iter().map(|&p| curve.pl_at(p)).collect();
    let slope = curve.right_tail_slope();
    let linear = curve.is_piecewise_linear();
    let last = prices.len() - 1;

    let mut roots = Vec::new();
    for i in 0..prices.len() {
        if values[i].is_zero() {
            let left_flat = i > 0 && values[i - 1].is_zero();
            let right_flat = if i < last {
                values[i + 1].is_zero()
            } else {
                linear && slope.is_zero()
            };
            if !left_flat && !right_flat {
                roots.push(prices[i]);
            }
        }
        if i < last && crosses(values[i], values[i + 1]) {
            let root = if linear {
                interpolate(prices[i], values[i], prices[i + 1], values[i + 1])
            } else {
                bisect(curve, prices[i], prices[i + 1], values[i])
            };
            roots.push(root);
        }
    }

    let (edge, edge_value) = (prices[last], values[last]);
    let heads_back = !edge_value.is_zero()
        && !slope.is_zero()
        && (edge_value > Decimal::ZERO) != (slope > Decimal::ZERO);
    if heads_back {
        if linear {
            roots.push((edge - edge_value / slope).normalize());
        } else if let Some(root) = tail_root(curve, edge, edge_value) {
            roots.push(root);
        }
    }

    debug!(count = roots.len(), linear, "breakevens located");
    roots
}

fn crosses(a: Money, b: Money) -> bool {
    (a < Decimal::ZERO && b > Decimal::ZERO) || (a > Decimal::ZERO && b < Decimal::ZERO)
}

fn interpolate(x0: Money, y0: Money, x1: Money, y1: Money) -> Money {
    (x0 - y0 * (x1 - x0) / (y1 - y0)).normalize()
}

/// Bisection on `[lo, hi]` where P/L changes sign; `f_lo` is the value at `lo`.
fn bisect(curve: &PayoffCurve, mut lo: Money, mut hi: Money, mut f_lo: Money) -> Money {
    let two = Decimal::TWO;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        if hi - lo < PRICE_TOLERANCE {
            break;
        }
        let mid = (lo + hi) / two;
        let f_mid = curve.pl_at(mid);
        if f_mid.is_zero() {
            return mid.round_dp(8).normalize();
        }
        if (f_mid < Decimal::ZERO) == (f_lo < Decimal::ZERO) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    ((lo + hi) / two).round_dp(8).normalize()
}

fn tail_root(curve: &PayoffCurve, edge: Money, edge_value: Money) -> Option<Money> {
    let mut hi = edge.max(Decimal::ONE);
    for _ in 0..MAX_TAIL_DOUBLINGS {
        hi *= Decimal::TWO;
        if crosses(edge_value, curve.pl_at(hi)) {
            return Some(bisect(curve, edge, hi, edge_value));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::leg::{
        Direction, EvaluationMode, MarketParameters, OptionLeg, OptionType, Strategy,
    };

    fn market() -> MarketParameters {
        MarketParameters::new(dec!(100), dec!(0.25), dec!(0.05))
    }

    fn leg(id: &str, ty: OptionType, dir: Direction, k: Decimal, premium: Decimal) -> OptionLeg {
        OptionLeg::new(id, ty, dir, k, dec!(1), premium, dec!(0.25))
    }

    fn expiry_breakevens(strategy: &Strategy) -> Vec<Money> {
        let m = market();
        let curve = PayoffCurve::new(strategy, &m, EvaluationMode::AtExpiration);
        find_breakevens(&curve, dec!(400))
    }

    #[test]
    fn test_long_call_breakeven() {
        let s = Strategy::new("lc", dec!(100)).with_leg(leg(
            "c",
            OptionType::Call,
            Direction::Long,
            dec!(100),
            dec!(5),
        ));
        assert_eq!(expiry_breakevens(&s), vec![dec!(105)]);
    }

    #[test]
    fn test_bull_call_spread_breakeven() {
        let s = Strategy::new("bcs", dec!(180))
            .with_leg(leg("a", OptionType::Call, Direction::Long, dec!(175), dec!(5)))
            .with_leg(leg("b", OptionType::Call, Direction::Short, dec!(185), dec!(2)));
        assert_eq!(expiry_breakevens(&s), vec![dec!(178)]);
    }

    #[test]
    fn test_long_straddle_two_breakevens() {
        let s = Strategy::new("straddle", dec!(100))
            .with_leg(leg("p", OptionType::Put, Direction::Long, dec!(100), dec!(4)))
            .with_leg(leg("c", OptionType::Call, Direction::Long, dec!(100), dec!(6)));
        assert_eq!(expiry_breakevens(&s), vec![dec!(90), dec!(110)]);
    }

    #[test]
    fn test_self_cancelling_legs_have_no_breakevens() {
        let s = Strategy::new("flat", dec!(100))
            .with_leg(leg("a", OptionType::Call, Direction::Long, dec!(100), dec!(5)))
            .with_leg(leg("b", OptionType::Call, Direction::Short, dec!(100), dec!(5)));
        assert!(expiry_breakevens(&s).is_empty());
    }

    #[test]
    fn test_touching_zero_at_strike_counts_once() {
        // Short straddle with zero premium touches zero only at the strike
        let s = Strategy::new("touch", dec!(100))
            .with_leg(leg("p", OptionType::Put, Direction::Short, dec!(100), dec!(0)))
            .with_leg(leg("c", OptionType::Call, Direction::Short, dec!(100), dec!(0)));
        assert_eq!(expiry_breakevens(&s), vec![dec!(100)]);
    }

    #[test]
    fn test_today_curve_breakeven_by_bisection() {
        let s = Strategy::new("lc", dec!(100)).with_leg(leg(
            "c",
            OptionType::Call,
            Direction::Long,
            dec!(100),
            dec!(5),
        ));
        let m = market();
        let curve = PayoffCurve::new(&s, &m, EvaluationMode::Today);
        let roots = find_breakevens(&curve, dec!(400));
        assert_eq!(roots.len(), 1);
        let residual = curve.pl_at(roots[0]).abs();
        assert!(residual < dec!(0.001), "residual {residual}");
        // Time value lowers the breakeven below the expiration figure
        assert!(roots[0] < dec!(105));
    }
}

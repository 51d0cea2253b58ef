use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::simulation::payoff::PayoffCurve;
use crate::types::*;

/// Below this magnitude a sampled asymptotic slope counts as flat.
const SLOPE_TOLERANCE: Decimal = dec!(0.000000001);

/// A maximum profit or loss figure. Serialises as the number itself or the
/// string `"unbounded"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBound {
    Bounded(Money),
    Unbounded,
}

impl RiskBound {
    pub fn value(&self) -> Option<Money> {
        match self {
            RiskBound::Bounded(v) => Some(*v),
            RiskBound::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, RiskBound::Unbounded)
    }
}

impl fmt::Display for RiskBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBound::Bounded(v) => write!(f, "{v}"),
            RiskBound::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl Serialize for RiskBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RiskBound::Bounded(v) => Serialize::serialize(v, serializer),
            RiskBound::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RiskBoundRepr {
    Value(Decimal),
    Text(String),
}

impl<'de> Deserialize<'de> for RiskBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RiskBoundRepr::deserialize(deserializer)? {
            RiskBoundRepr::Value(v) => Ok(RiskBound::Bounded(v)),
            RiskBoundRepr::Text(s) if s.eq_ignore_ascii_case("unbounded") => Ok(RiskBound::Unbounded),
            RiskBoundRepr::Text(s) => Err(D::Error::custom(format!(
                "expected a number or \"unbounded\", found \"{s}\""
            ))),
        }
    }
}

/// Extremes of a payoff curve. `max_loss` is a positive magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskProfile {
    pub max_profit: RiskBound,
    pub max_loss: RiskBound,
}

/// Maximum profit and loss over all non-negative underlying prices.
///
/// The left end is always P = 0. On a piecewise-linear curve the extremes sit
/// on strikes, so only those are evaluated; otherwise the curve is sampled
/// over `[0, search_upper]`. The right tail decides unboundedness.
pub fn risk_profile(curve: &PayoffCurve, search_upper: Money) -> RiskProfile {
    let values: Vec<Money> = curve
        .inspection_prices(search_upper)
        .into_iter()
        .map(|p| curve.pl_at(p))
        .collect();

    let highest = values.iter().copied().max().unwrap_or(Decimal::ZERO);
    let lowest = values.iter().copied().min().unwrap_or(Decimal::ZERO);

    let slope = curve.right_tail_slope();
    let tolerance = if curve.is_piecewise_linear() {
        Decimal::ZERO
    } else {
        SLOPE_TOLERANCE
    };

    let max_profit = if slope > tolerance {
        RiskBound::Unbounded
    } else {
        RiskBound::Bounded(highest.max(Decimal::ZERO))
    };
    let max_loss = if slope < -tolerance {
        RiskBound::Unbounded
    } else {
        RiskBound::Bounded((-lowest).max(Decimal::ZERO))
    };

    RiskProfile {
        max_profit,
        max_loss,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

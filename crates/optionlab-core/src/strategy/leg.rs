use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::strategy::presets::PresetKind;
use crate::types::*;

/// Maximum number of legs a strategy may carry.
pub const MAX_LEGS: usize = 6;

/// Shares controlled by one standard equity option contract.
pub const DEFAULT_CONTRACT_MULTIPLIER: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for a bought leg, -1 for a sold leg.
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Which payoff curve the simulator evaluates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationMode {
    /// Theoretical value with the time remaining on each leg.
    #[default]
    Today,
    /// Payoff at the nearest expiration date.
    AtExpiration,
}

// ---------------------------------------------------------------------------
// Leg and strategy
// ---------------------------------------------------------------------------

/// One option position. Construction never validates; see
/// [`crate::strategy::validation::validate_strategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub id: String,
    pub option_type: OptionType,
    pub direction: Direction,
    pub strike: Money,
    /// Number of contracts. Kept as Decimal so fractional input can be reported.
    pub quantity: Decimal,
    #[serde(default = "default_multiplier")]
    pub contract_multiplier: Decimal,
    /// Premium per share paid (long) or received (short) at entry.
    pub entry_premium: Money,
    pub time_to_expiration: Years,
}

fn default_multiplier() -> Decimal {
    DEFAULT_CONTRACT_MULTIPLIER
}

impl OptionLeg {
    pub fn new(
        id: impl Into<String>,
        option_type: OptionType,
        direction: Direction,
        strike: Money,
        quantity: Decimal,
        entry_premium: Money,
        time_to_expiration: Years,
    ) -> Self {
        Self {
            id: id.into(),
            option_type,
            direction,
            strike,
            quantity,
            contract_multiplier: DEFAULT_CONTRACT_MULTIPLIER,
            entry_premium,
            time_to_expiration,
        }
    }

    pub fn with_multiplier(mut self, multiplier: Decimal) -> Self {
        self.contract_multiplier = multiplier;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// direction sign * quantity * multiplier: converts per-share figures into position cash.
    pub fn position_scale(&self) -> Decimal {
        self.direction.sign() * self.quantity * self.contract_multiplier
    }

    /// Signed cash flow at entry: positive for premium received, negative for premium paid.
    pub fn entry_cash_flow(&self) -> Money {
        -self.position_scale() * self.entry_premium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub underlying_price_at_entry: Money,
    pub legs: Vec<OptionLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetKind>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, underlying_price_at_entry: Money) -> Self {
        Self {
            name: name.into(),
            underlying_price_at_entry,
            legs: Vec::new(),
            preset: None,
        }
    }

    /// Returns a new strategy with the leg appended. The leg limit is
    /// enforced by validation, not here.
    pub fn with_leg(mut self, leg: OptionLeg) -> Self {
        self.legs.push(leg);
        self
    }

    pub fn with_preset(mut self, preset: PresetKind) -> Self {
        self.preset = Some(preset);
        self
    }

    /// Sorted, de-duplicated strikes of all legs.
    pub fn strikes(&self) -> Vec<Money> {
        let mut strikes: Vec<Money> = self.legs.iter().map(|l| l.strike).collect();
        strikes.sort();
        strikes.dedup();
        strikes
    }

    pub fn min_expiration(&self) -> Years {
        self.legs
            .iter()
            .map(|l| l.time_to_expiration)
            .min()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn max_expiration(&self) -> Years {
        self.legs
            .iter()
            .map(|l| l.time_to_expiration)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// True when legs expire on different dates (calendar / diagonal).
    pub fn has_mixed_expirations(&self) -> bool {
        self.min_expiration() != self.max_expiration()
    }
}

/// Market inputs supplied per evaluation; not owned by the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    pub current_underlying_price: Money,
    /// Annualised flat volatility (0.25 = 25%).
    pub volatility: Rate,
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    /// Years elapsed since entry; shortens every leg's remaining life.
    #[serde(default)]
    pub elapsed_time: Years,
}

impl MarketParameters {
    pub fn new(current_underlying_price: Money, volatility: Rate, risk_free_rate: Rate) -> Self {
        Self {
            current_underlying_price,
            volatility,
            risk_free_rate,
            dividend_yield: Decimal::ZERO,
            elapsed_time: Decimal::ZERO,
        }
    }

    pub fn with_dividend_yield(mut self, dividend_yield: Rate) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_elapsed_time(mut self, elapsed_time: Years) -> Self {
        self.elapsed_time = elapsed_time;
        self
    }

    /// Time left on a leg after `elapsed_time`, floored at zero.
    pub fn remaining_time(&self, leg: &OptionLeg) -> Years {
        (leg.time_to_expiration - self.elapsed_time).max(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, direction: Direction, strike: Decimal, premium: Decimal) -> OptionLeg {
        OptionLeg::new(
            id,
            OptionType::Call,
            direction,
            strike,
            dec!(1),
            premium,
            dec!(0.25),
        )
    }

    #[test]
    fn test_entry_cash_flow_sign_convention() {
        // Buying costs money, selling brings it in
        let long = call("a", Direction::Long, dec!(100), dec!(5));
        let short = call("b", Direction::Short, dec!(110), dec!(2));
        assert_eq!(long.entry_cash_flow(), dec!(-500));
        assert_eq!(short.entry_cash_flow(), dec!(200));
    }

    #[test]
    fn test_default_multiplier_applied_on_deserialize() {
        let json = r#"{
            "id": "x",
            "option_type": "Put",
            "direction": "Short",
            "strike": "95",
            "quantity": "2",
            "entry_premium": "1.5",
            "time_to_expiration": "0.5"
        }"#;
        let leg: OptionLeg = serde_json::from_str(json).unwrap();
        assert_eq!(leg.contract_multiplier, dec!(100));
        assert_eq!(leg.position_scale(), dec!(-200));
    }

    #[test]
    fn test_with_leg_does_not_mutate_original() {
        let base = Strategy::new("s", dec!(100)).with_leg(call("a", Direction::Long, dec!(100), dec!(5)));
        let extended = base.clone().with_leg(call("b", Direction::Short, dec!(110), dec!(2)));
        assert_eq!(base.legs.len(), 1);
        assert_eq!(extended.legs.len(), 2);
        assert_eq!(extended.strikes(), vec![dec!(100), dec!(110)]);
    }

    #[test]
    fn test_mixed_expirations_detected() {
        let near = call("near", Direction::Short, dec!(100), dec!(3));
        let mut far = call("far", Direction::Long, dec!(100), dec!(5));
        far.time_to_expiration = dec!(0.5);
        let s = Strategy::new("calendar", dec!(100)).with_leg(near).with_leg(far);
        assert!(s.has_mixed_expirations());
        assert_eq!(s.min_expiration(), dec!(0.25));
        assert_eq!(s.max_expiration(), dec!(0.5));
    }

    #[test]
    fn test_remaining_time_floors_at_zero() {
        let leg = call("a", Direction::Long, dec!(100), dec!(5));
        let market = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05)).with_elapsed_time(dec!(1));
        assert_eq!(market.remaining_time(&leg), Decimal::ZERO);
    }
}

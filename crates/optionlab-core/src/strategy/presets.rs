//! Named strategy templates.
//!
//! Every builder returns a plain [`Strategy`] tagged with its [`PresetKind`];
//! the result is validated through the same path as hand-built strategies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OptionLabError;
use crate::strategy::leg::{Direction, OptionLeg, OptionType, Strategy};
use crate::types::*;
use crate::OptionLabResult;

use Direction::{Long, Short};
use OptionType::{Call, Put};

// ---------------------------------------------------------------------------
// Preset catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetKind {
    LongCall,
    LongPut,
    ShortCall,
    ShortPut,
    BullCallSpread,
    BearCallSpread,
    BullPutSpread,
    BearPutSpread,
    LongStraddle,
    ShortStraddle,
    LongStrangle,
    ShortStrangle,
    IronCondor,
    IronButterfly,
    CallButterfly,
    PutButterfly,
    CalendarCallSpread,
    DiagonalCallSpread,
}

/// Whether opening the preset should pay or collect premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumSign {
    Debit,
    Credit,
    Either,
}

impl PresetKind {
    pub const ALL: [PresetKind; 18] = [
        PresetKind::LongCall,
        PresetKind::LongPut,
        PresetKind::ShortCall,
        PresetKind::ShortPut,
        PresetKind::BullCallSpread,
        PresetKind::BearCallSpread,
        PresetKind::BullPutSpread,
        PresetKind::BearPutSpread,
        PresetKind::LongStraddle,
        PresetKind::ShortStraddle,
        PresetKind::LongStrangle,
        PresetKind::ShortStrangle,
        PresetKind::IronCondor,
        PresetKind::IronButterfly,
        PresetKind::CallButterfly,
        PresetKind::PutButterfly,
        PresetKind::CalendarCallSpread,
        PresetKind::DiagonalCallSpread,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            PresetKind::LongCall => "Long Call",
            PresetKind::LongPut => "Long Put",
            PresetKind::ShortCall => "Short Call",
            PresetKind::ShortPut => "Short Put",
            PresetKind::BullCallSpread => "Bull Call Spread",
            PresetKind::BearCallSpread => "Bear Call Spread",
            PresetKind::BullPutSpread => "Bull Put Spread",
            PresetKind::BearPutSpread => "Bear Put Spread",
            PresetKind::LongStraddle => "Long Straddle",
            PresetKind::ShortStraddle => "Short Straddle",
            PresetKind::LongStrangle => "Long Strangle",
            PresetKind::ShortStrangle => "Short Strangle",
            PresetKind::IronCondor => "Iron Condor",
            PresetKind::IronButterfly => "Iron Butterfly",
            PresetKind::CallButterfly => "Call Butterfly",
            PresetKind::PutButterfly => "Put Butterfly",
            PresetKind::CalendarCallSpread => "Calendar Call Spread",
            PresetKind::DiagonalCallSpread => "Diagonal Call Spread",
        }
    }

    /// Leg shapes in canonical order (ascending strike, then near before far).
    pub fn leg_pattern(self) -> &'static [(OptionType, Direction)] {
        match self {
            PresetKind::LongCall => &[(Call, Long)],
            PresetKind::LongPut => &[(Put, Long)],
            PresetKind::ShortCall => &[(Call, Short)],
            PresetKind::ShortPut => &[(Put, Short)],
            PresetKind::BullCallSpread => &[(Call, Long), (Call, Short)],
            PresetKind::BearCallSpread => &[(Call, Short), (Call, Long)],
            PresetKind::BullPutSpread => &[(Put, Long), (Put, Short)],
            PresetKind::BearPutSpread => &[(Put, Short), (Put, Long)],
            PresetKind::LongStraddle | PresetKind::LongStrangle => &[(Put, Long), (Call, Long)],
            PresetKind::ShortStraddle | PresetKind::ShortStrangle => &[(Put, Short), (Call, Short)],
            PresetKind::IronCondor | PresetKind::IronButterfly => {
                &[(Put, Long), (Put, Short), (Call, Short), (Call, Long)]
            }
            PresetKind::CallButterfly => &[(Call, Long), (Call, Short), (Call, Long)],
            PresetKind::PutButterfly => &[(Put, Long), (Put, Short), (Put, Long)],
            PresetKind::CalendarCallSpread | PresetKind::DiagonalCallSpread => {
                &[(Call, Short), (Call, Long)]
            }
        }
    }

    pub fn expected_premium(self) -> PremiumSign {
        match self {
            PresetKind::LongCall
            | PresetKind::LongPut
            | PresetKind::BullCallSpread
            | PresetKind::BearPutSpread
            | PresetKind::LongStraddle
            | PresetKind::LongStrangle
            | PresetKind::CallButterfly
            | PresetKind::PutButterfly
            | PresetKind::CalendarCallSpread => PremiumSign::Debit,
            PresetKind::ShortCall
            | PresetKind::ShortPut
            | PresetKind::BearCallSpread
            | PresetKind::BullPutSpread
            | PresetKind::ShortStraddle
            | PresetKind::ShortStrangle
            | PresetKind::IronCondor
            | PresetKind::IronButterfly => PremiumSign::Credit,
            PresetKind::DiagonalCallSpread => PremiumSign::Either,
        }
    }

    /// Human-readable descriptions of every way `strategy` departs from this preset.
    pub fn mismatches(self, strategy: &Strategy) -> Vec<String> {
        let mut out = Vec::new();
        let pattern = self.leg_pattern();
        let legs = canonical_order(&strategy.legs);

        let shapes: Vec<(OptionType, Direction)> =
            legs.iter().map(|l| (l.option_type, l.direction)).collect();
        if shapes.as_slice() != pattern {
            out.push(format!(
                "{} expects legs {}, found {}",
                self.display_name(),
                describe_shapes(pattern),
                describe_shapes(&shapes)
            ));
            // Strike checks index into the pattern; skip them on a shape mismatch.
            out.extend(self.premium_mismatch(strategy));
            return out;
        }

        if !self.strikes_match(&legs) {
            out.push(format!(
                "{} strikes or expirations do not follow the expected layout",
                self.display_name()
            ));
        }
        out.extend(self.premium_mismatch(strategy));
        out
    }

    fn premium_mismatch(self, strategy: &Strategy) -> Option<String> {
        let net: Money = strategy.legs.iter().map(|l| l.entry_cash_flow()).sum();
        match self.expected_premium() {
            PremiumSign::Debit if net > Decimal::ZERO => Some(format!(
                "{} should be opened for a net debit, but collects {net}",
                self.display_name()
            )),
            PremiumSign::Credit if net < Decimal::ZERO => Some(format!(
                "{} should be opened for a net credit, but costs {}",
                self.display_name(),
                -net
            )),
            _ => None,
        }
    }

    /// `legs` must already be in canonical order and match the leg pattern.
    fn strikes_match(self, legs: &[&OptionLeg]) -> bool {
        let k: Vec<Money> = legs.iter().map(|l| l.strike).collect();
        let t: Vec<Years> = legs.iter().map(|l| l.time_to_expiration).collect();
        let same_expiry = t.windows(2).all(|w| w[0] == w[1]);
        match self {
            PresetKind::LongCall
            | PresetKind::LongPut
            | PresetKind::ShortCall
            | PresetKind::ShortPut => true,
            PresetKind::BullCallSpread
            | PresetKind::BearCallSpread
            | PresetKind::BullPutSpread
            | PresetKind::BearPutSpread => same_expiry && k[0] < k[1],
            PresetKind::LongStraddle | PresetKind::ShortStraddle => same_expiry && k[0] == k[1],
            PresetKind::LongStrangle | PresetKind::ShortStrangle => same_expiry && k[0] < k[1],
            PresetKind::IronCondor => same_expiry && k[0] < k[1] && k[1] < k[2] && k[2] < k[3],
            PresetKind::IronButterfly => same_expiry && k[0] < k[1] && k[1] == k[2] && k[2] < k[3],
            PresetKind::CallButterfly | PresetKind::PutButterfly => {
                let long_wings = legs[0].quantity + legs[2].quantity;
                same_expiry && k[0] < k[1] && k[1] < k[2] && legs[1].quantity == long_wings
            }
            PresetKind::CalendarCallSpread => k[0] == k[1] && t[0] < t[1],
            PresetKind::DiagonalCallSpread => k[0] != k[1] && t[0] < t[1],
        }
    }
}

/// Puts before calls; then, for time spreads, near before far; then ascending
/// strike; short before long at the same strike and expiry.
fn canonical_order(legs: &[OptionLeg]) -> Vec<&OptionLeg> {
    let mut sorted: Vec<&OptionLeg> = legs.iter().collect();
    sorted.sort_by(|a, b| {
        let type_rank = |l: &OptionLeg| matches!(l.option_type, Call) as u8;
        let dir_rank = |l: &OptionLeg| matches!(l.direction, Long) as u8;
        type_rank(*a)
            .cmp(&type_rank(*b))
            .then(a.time_to_expiration.cmp(&b.time_to_expiration))
            .then(a.strike.cmp(&b.strike))
            .then(dir_rank(*a).cmp(&dir_rank(*b)))
    });
    sorted
}

fn describe_shapes(shapes: &[(OptionType, Direction)]) -> String {
    shapes
        .iter()
        .map(|(ty, dir)| format!("{dir:?} {ty:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Strike and per-share premium for one leg of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub strike: Money,
    pub premium: Money,
}

impl Quote {
    pub fn new(strike: Money, premium: Money) -> Self {
        Self { strike, premium }
    }
}

fn leg(
    n: usize,
    option_type: OptionType,
    direction: Direction,
    quote: Quote,
    quantity: Decimal,
    t: Years,
) -> OptionLeg {
    OptionLeg::new(
        format!("leg-{n}"),
        option_type,
        direction,
        quote.strike,
        quantity,
        quote.premium,
        t,
    )
}

fn assemble(kind: PresetKind, underlying: Money, legs: Vec<OptionLeg>) -> Strategy {
    Strategy {
        name: kind.display_name().to_string(),
        underlying_price_at_entry: underlying,
        legs,
        preset: Some(kind),
    }
}

fn single(kind: PresetKind, underlying: Money, quote: Quote, t: Years) -> Strategy {
    let (ty, dir) = kind.leg_pattern()[0];
    assemble(kind, underlying, vec![leg(1, ty, dir, quote, Decimal::ONE, t)])
}

pub fn long_call(underlying: Money, quote: Quote, t: Years) -> Strategy {
    single(PresetKind::LongCall, underlying, quote, t)
}

pub fn long_put(underlying: Money, quote: Quote, t: Years) -> Strategy {
    single(PresetKind::LongPut, underlying, quote, t)
}

pub fn short_call(underlying: Money, quote: Quote, t: Years) -> Strategy {
    single(PresetKind::ShortCall, underlying, quote, t)
}

pub fn short_put(underlying: Money, quote: Quote, t: Years) -> Strategy {
    single(PresetKind::ShortPut, underlying, quote, t)
}

/// Two legs of the same type and expiry following the preset's pattern, lower strike first.
fn vertical(kind: PresetKind, underlying: Money, lower: Quote, upper: Quote, t: Years) -> Strategy {
    let p = kind.leg_pattern();
    assemble(
        kind,
        underlying,
        vec![
            leg(1, p[0].0, p[0].1, lower, Decimal::ONE, t),
            leg(2, p[1].0, p[1].1, upper, Decimal::ONE, t),
        ],
    )
}

/// Buy the lower call, sell the upper call (net debit).
pub fn bull_call_spread(underlying: Money, lower: Quote, upper: Quote, t: Years) -> Strategy {
    vertical(PresetKind::BullCallSpread, underlying, lower, upper, t)
}

/// Sell the lower call, buy the upper call (net credit).
pub fn bear_call_spread(underlying: Money, lower: Quote, upper: Quote, t: Years) -> Strategy {
    vertical(PresetKind::BearCallSpread, underlying, lower, upper, t)
}

/// Buy the lower put, sell the upper put (net credit).
pub fn bull_put_spread(underlying: Money, lower: Quote, upper: Quote, t: Years) -> Strategy {
    vertical(PresetKind::BullPutSpread, underlying, lower, upper, t)
}

/// Sell the lower put, buy the upper put (net debit).
pub fn bear_put_spread(underlying: Money, lower: Quote, upper: Quote, t: Years) -> Strategy {
    vertical(PresetKind::BearPutSpread, underlying, lower, upper, t)
}

fn put_call_pair(kind: PresetKind, underlying: Money, put: Quote, call: Quote, t: Years) -> Strategy {
    vertical(kind, underlying, put, call, t)
}

pub fn long_straddle(underlying: Money, put: Quote, call: Quote, t: Years) -> Strategy {
    put_call_pair(PresetKind::LongStraddle, underlying, put, call, t)
}

pub fn short_straddle(underlying: Money, put: Quote, call: Quote, t: Years) -> Strategy {
    put_call_pair(PresetKind::ShortStraddle, underlying, put, call, t)
}

pub fn long_strangle(underlying: Money, put: Quote, call: Quote, t: Years) -> Strategy {
    put_call_pair(PresetKind::LongStrangle, underlying, put, call, t)
}

pub fn short_strangle(underlying: Money, put: Quote, call: Quote, t: Years) -> Strategy {
    put_call_pair(PresetKind::ShortStrangle, underlying, put, call, t)
}

fn four_leg(kind: PresetKind, underlying: Money, quotes: [Quote; 4], t: Years) -> Strategy {
    let legs = kind
        .leg_pattern()
        .iter()
        .zip(quotes)
        .enumerate()
        .map(|(i, (&(ty, dir), q))| leg(i + 1, ty, dir, q, Decimal::ONE, t))
        .collect();
    assemble(kind, underlying, legs)
}

/// Quotes in ascending strike order: long put, short put, short call, long call.
pub fn iron_condor(underlying: Money, quotes: [Quote; 4], t: Years) -> Strategy {
    four_leg(PresetKind::IronCondor, underlying, quotes, t)
}

/// Same layout as the iron condor with the two short strikes equal.
pub fn iron_butterfly(underlying: Money, quotes: [Quote; 4], t: Years) -> Strategy {
    four_leg(PresetKind::IronButterfly, underlying, quotes, t)
}

fn butterfly(
    kind: PresetKind,
    underlying: Money,
    lower: Quote,
    middle: Quote,
    upper: Quote,
    t: Years,
) -> Strategy {
    let ty = kind.leg_pattern()[0].0;
    assemble(
        kind,
        underlying,
        vec![
            leg(1, ty, Long, lower, Decimal::ONE, t),
            leg(2, ty, Short, middle, Decimal::TWO, t),
            leg(3, ty, Long, upper, Decimal::ONE, t),
        ],
    )
}

/// Long one lower call, short two middle calls, long one upper call.
pub fn call_butterfly(underlying: Money, lower: Quote, middle: Quote, upper: Quote, t: Years) -> Strategy {
    butterfly(PresetKind::CallButterfly, underlying, lower, middle, upper, t)
}

pub fn put_butterfly(underlying: Money, lower: Quote, middle: Quote, upper: Quote, t: Years) -> Strategy {
    butterfly(PresetKind::PutButterfly, underlying, lower, middle, upper, t)
}

fn time_spread(
    kind: PresetKind,
    underlying: Money,
    near: Quote,
    far: Quote,
    near_t: Years,
    far_t: Years,
) -> Strategy {
    assemble(
        kind,
        underlying,
        vec![
            leg(1, Call, Short, near, Decimal::ONE, near_t),
            leg(2, Call, Long, far, Decimal::ONE, far_t),
        ],
    )
}

/// Sell the near-dated call, buy the far-dated call at the same strike.
pub fn calendar_call_spread(
    underlying: Money,
    strike: Money,
    near_premium: Money,
    far_premium: Money,
    near_t: Years,
    far_t: Years,
) -> Strategy {
    time_spread(
        PresetKind::CalendarCallSpread,
        underlying,
        Quote::new(strike, near_premium),
        Quote::new(strike, far_premium),
        near_t,
        far_t,
    )
}

/// Sell the near-dated call, buy a far-dated call at a different strike.
pub fn diagonal_call_spread(
    underlying: Money,
    near: Quote,
    far: Quote,
    near_t: Years,
    far_t: Years,
) -> Strategy {
    time_spread(PresetKind::DiagonalCallSpread, underlying, near, far, near_t, far_t)
}

// ---------------------------------------------------------------------------
// Generic entry point
// ---------------------------------------------------------------------------

/// Parameters for [`build_preset`]; quotes follow the preset's leg pattern order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetParams {
    pub kind: PresetKind,
    pub underlying_price: Money,
    pub quotes: Vec<Quote>,
    pub time_to_expiration: Years,
    /// Far leg expiry for calendar and diagonal spreads.
    #[serde(default)]
    pub far_time_to_expiration: Option<Years>,
    /// Contracts per unit leg; butterfly bodies get twice this.
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

pub fn build_preset(params: &PresetParams) -> OptionLabResult<Strategy> {
    let kind = params.kind;
    let expected = kind.leg_pattern().len();
    if params.quotes.len() != expected {
        return Err(OptionLabError::InvalidInput {
            field: "quotes".into(),
            reason: format!(
                "{} needs {expected} quote(s), got {}",
                kind.display_name(),
                params.quotes.len()
            ),
        });
    }

    let s = params.underlying_price;
    let t = params.time_to_expiration;
    let q = &params.quotes;
    let far_t = || {
        params.far_time_to_expiration.ok_or_else(|| OptionLabError::InvalidInput {
            field: "far_time_to_expiration".into(),
            reason: format!("required for {}", kind.display_name()),
        })
    };

    let strategy = match kind {
        PresetKind::LongCall => long_call(s, q[0], t),
        PresetKind::LongPut => long_put(s, q[0], t),
        PresetKind::ShortCall => short_call(s, q[0], t),
        PresetKind::ShortPut => short_put(s, q[0], t),
        PresetKind::BullCallSpread => bull_call_spread(s, q[0], q[1], t),
        PresetKind::BearCallSpread => bear_call_spread(s, q[0], q[1], t),
        PresetKind::BullPutSpread => bull_put_spread(s, q[0], q[1], t),
        PresetKind::BearPutSpread => bear_put_spread(s, q[0], q[1], t),
        PresetKind::LongStraddle => long_straddle(s, q[0], q[1], t),
        PresetKind::ShortStraddle => short_straddle(s, q[0], q[1], t),
        PresetKind::LongStrangle => long_strangle(s, q[0], q[1], t),
        PresetKind::ShortStrangle => short_strangle(s, q[0], q[1], t),
        PresetKind::IronCondor => iron_condor(s, [q[0], q[1], q[2], q[3]], t),
        PresetKind::IronButterfly => iron_butterfly(s, [q[0], q[1], q[2], q[3]], t),
        PresetKind::CallButterfly => call_butterfly(s, q[0], q[1], q[2], t),
        PresetKind::PutButterfly => put_butterfly(s, q[0], q[1], q[2], t),
        PresetKind::CalendarCallSpread => {
            calendar_call_spread(s, q[0].strike, q[0].premium, q[1].premium, t, far_t()?)
        }
        PresetKind::DiagonalCallSpread => diagonal_call_spread(s, q[0], q[1], t, far_t()?),
    };

    let mut strategy = strategy;
    for leg in &mut strategy.legs {
        leg.quantity *= params.quantity;
    }
    Ok(strategy)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

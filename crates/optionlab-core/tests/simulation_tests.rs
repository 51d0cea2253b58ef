use optionlab_core::simulation::payoff::PayoffCurve;
use optionlab_core::simulation::risk::RiskBound;
use optionlab_core::simulation::simulator::{analyze_strategy, RiskWarning, StrategyAnalysisInput};
use optionlab_core::simulation::grid::{PriceRange, SimulationConfig};
use optionlab_core::strategy::presets::{self, Quote};
use optionlab_core::{
    simulate_strategy, simulate_with_config, Direction, EvaluationMode, MarketParameters,
    OptionLeg, OptionType, Strategy,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn market(price: Decimal) -> MarketParameters {
    MarketParameters::new(price, dec!(0.25), dec!(0.05))
}

// ===========================================================================
// Reference strategies
// ===========================================================================

#[test]
fn test_bull_call_spread_reference_figures() {
    let s = presets::bull_call_spread(
        dec!(180),
        Quote::new(dec!(175), dec!(5)),
        Quote::new(dec!(185), dec!(2)),
        dec!(0.25),
    );
    let r = simulate_strategy(&s, &market(dec!(180)), EvaluationMode::AtExpiration).unwrap();
    assert_eq!(r.net_premium, dec!(-300));
    assert_eq!(r.max_profit, RiskBound::Bounded(dec!(700)));
    assert_eq!(r.max_loss, RiskBound::Bounded(dec!(300)));
    assert_eq!(r.breakevens, vec![dec!(178)]);
    // 180 at expiry: long 175 call worth 5, short 185 call worthless
    assert_eq!(r.total_pl, dec!(200));
}

#[test]
fn test_long_call_breakeven_and_unbounded_profit() {
    let s = presets::long_call(dec!(100), Quote::new(dec!(100), dec!(5)), dec!(0.5));
    let r = simulate_strategy(&s, &market(dec!(100)), EvaluationMode::AtExpiration).unwrap();
    assert_eq!(r.breakevens, vec![dec!(105)]);
    assert_eq!(r.max_profit, RiskBound::Unbounded);
    assert_eq!(r.max_loss, RiskBound::Bounded(dec!(500)));
    assert_eq!(r.warnings, vec![RiskWarning::UnboundedProfit]);
    assert_eq!(r.risk_reward_ratio, None);
}

#[test]
fn test_short_call_warns_unbounded_loss() {
    let s = presets::short_call(dec!(100), Quote::new(dec!(105), dec!(2)), dec!(0.25));
    let r = simulate_strategy(&s, &market(dec!(100)), EvaluationMode::Today).unwrap();
    assert_eq!(r.max_loss, RiskBound::Unbounded);
    assert_eq!(r.warnings, vec![RiskWarning::UnboundedLoss]);
}

#[test]
fn test_iron_condor_preset() {
    let s = presets::iron_condor(
        dec!(100),
        [
            Quote::new(dec!(90), dec!(1)),
            Quote::new(dec!(95), dec!(2)),
            Quote::new(dec!(105), dec!(2)),
            Quote::new(dec!(110), dec!(1)),
        ],
        dec!(0.25),
    );
    let r = simulate_strategy(&s, &market(dec!(100)), EvaluationMode::AtExpiration).unwrap();
    assert_eq!(r.net_premium, dec!(200));
    assert_eq!(r.breakevens, vec![dec!(93), dec!(107)]);
    assert_eq!(r.max_profit, RiskBound::Bounded(dec!(200)));
    assert_eq!(r.max_loss, RiskBound::Bounded(dec!(300)));
    assert_eq!(r.total_pl_percent, Some(dec!(100)));
    assert!(r.warnings.is_empty());
}

#[test]
fn test_self_cancelling_legs_are_flat() {
    let leg = |id: &str, dir| {
        OptionLeg::new(id, OptionType::Put, dir, dec!(100), dec!(1), dec!(4), dec!(0.25))
    };
    let s = Strategy::new("flat", dec!(100))
        .with_leg(leg("buy", Direction::Long))
        .with_leg(leg("sell", Direction::Short));
    for mode in [EvaluationMode::Today, EvaluationMode::AtExpiration] {
        let r = simulate_strategy(&s, &market(dec!(97)), mode).unwrap();
        assert!(r.price_grid.iter().all(|p| p.pl.is_zero()));
        assert!(r.price_grid.iter().all(|p| p.greeks.delta.is_zero()));
        assert!(r.breakevens.is_empty());
        assert_eq!(r.total_pl_percent, None);
        assert_eq!(r.max_profit, RiskBound::Bounded(Decimal::ZERO));
        assert_eq!(r.max_loss, RiskBound::Bounded(Decimal::ZERO));
    }
}

// ===========================================================================
// Mixed expirations
// ===========================================================================

#[test]
fn test_calendar_spread_breakevens_by_bisection() {
    let s = presets::calendar_call_spread(dec!(100), dec!(100), dec!(3), dec!(5), dec!(0.25), dec!(0.5));
    let m = market(dec!(100));
    let r = simulate_strategy(&s, &m, EvaluationMode::AtExpiration).unwrap();

    assert_eq!(r.breakevens.len(), 2, "breakevens {:?}", r.breakevens);
    assert!(r.breakevens[0] < dec!(100) && r.breakevens[1] > dec!(100));

    let curve = PayoffCurve::new(&s, &m, EvaluationMode::AtExpiration);
    for be in &r.breakevens {
        let residual = curve.pl_at(*be).abs();
        assert!(residual < dec!(0.01), "P/L at {be} is {residual}");
    }

    // Worst case is the underlying collapsing: both calls worthless
    assert_eq!(r.max_loss, RiskBound::Bounded(dec!(200)));
    assert!(!r.max_profit.is_unbounded());
}

#[test]
fn test_at_expiration_keeps_far_leg_time_value() {
    let s = presets::calendar_call_spread(dec!(100), dec!(100), dec!(3), dec!(5), dec!(0.25), dec!(0.5));
    let r = simulate_strategy(&s, &market(dec!(100)), EvaluationMode::AtExpiration).unwrap();
    let far = r.per_leg.iter().find(|l| l.leg_id == "leg-2").unwrap();
    let near = r.per_leg.iter().find(|l| l.leg_id == "leg-1").unwrap();
    assert_eq!(near.value, Decimal::ZERO);
    assert!(far.value > dec!(4), "far leg value {}", far.value);
}

// ===========================================================================
// Time and configuration
// ===========================================================================

#[test]
fn test_elapsed_time_converges_today_to_expiration() {
    let s = presets::long_put(dec!(100), Quote::new(dec!(100), dec!(4)), dec!(0.5));
    let expiry = simulate_strategy(&s, &market(dec!(92)), EvaluationMode::AtExpiration).unwrap();
    let late = simulate_strategy(
        &s,
        &market(dec!(92)).with_elapsed_time(dec!(0.4999)),
        EvaluationMode::Today,
    )
    .unwrap();
    assert!((late.total_pl - expiry.total_pl).abs() < dec!(1));
    assert_eq!(expiry.total_pl, dec!(400));
}

#[test]
fn test_today_theta_is_negative_for_long_premium() {
    let s = presets::long_straddle(
        dec!(100),
        Quote::new(dec!(100), dec!(5)),
        Quote::new(dec!(100), dec!(6)),
        dec!(0.25),
    );
    let r = simulate_strategy(&s, &market(dec!(100)), EvaluationMode::Today).unwrap();
    assert!(r.greeks_aggregate.theta < Decimal::ZERO);
    assert!(r.greeks_aggregate.gamma > Decimal::ZERO);
    assert!(r.greeks_aggregate.vega > Decimal::ZERO);
    assert_eq!(r.per_leg.len(), 2);
}

#[test]
fn test_custom_price_range_is_respected_and_widened() {
    let s = presets::long_call(dec!(100), Quote::new(dec!(100), dec!(5)), dec!(0.25));
    let config = SimulationConfig {
        grid_points: 11,
        price_range: Some(PriceRange {
            lower: dec!(80),
            upper: dec!(100),
        }),
        ..SimulationConfig::default()
    };
    let r = simulate_with_config(&s, &market(dec!(100)), EvaluationMode::AtExpiration, &config).unwrap();
    let first = r.price_grid.first().unwrap().price;
    let last = r.price_grid.last().unwrap().price;
    assert_eq!(first, dec!(80));
    // Breakeven 105 plus 5% margin
    assert_eq!(last, dec!(110.25));
    assert!(r.price_grid.iter().any(|p| p.price == dec!(105)));
}

#[test]
fn test_identical_inputs_give_identical_results() {
    let s = presets::short_strangle(
        dec!(100),
        Quote::new(dec!(90), dec!(1.5)),
        Quote::new(dec!(110), dec!(1.2)),
        dec!(0.25),
    );
    let m = market(dec!(103)).with_dividend_yield(dec!(0.01));
    let a = simulate_strategy(&s, &m, EvaluationMode::Today).unwrap();
    let b = simulate_strategy(&s, &m, EvaluationMode::Today).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_analysis_from_json() {
    let json = r#"{
        "strategy": {
            "name": "covered put spread",
            "underlying_price_at_entry": "50",
            "legs": [
                {"id": "a", "option_type": "Put", "direction": "Long", "strike": "50",
                 "quantity": "2", "entry_premium": "2.1", "time_to_expiration": "0.1"},
                {"id": "b", "option_type": "Put", "direction": "Short", "strike": "45",
                 "quantity": "2", "entry_premium": "0.6", "time_to_expiration": "0.1"}
            ]
        },
        "market": {"current_underlying_price": "48", "volatility": "0.3", "risk_free_rate": "0.04"},
        "mode": "AtExpiration"
    }"#;
    let input: StrategyAnalysisInput = serde_json::from_str(json).unwrap();
    let out = analyze_strategy(&input).unwrap();
    let r = out.result;
    assert_eq!(r.net_premium, dec!(-300));
    assert_eq!(r.breakevens, vec![dec!(48.5)]);
    assert_eq!(r.max_profit, RiskBound::Bounded(dec!(700)));
    assert_eq!(r.max_loss, RiskBound::Bounded(dec!(300)));
}

use optionlab_core::export::csv::{parse_csv, summarize_rows, to_csv_string, write_csv, CSV_HEADER};
use optionlab_core::simulation::risk::RiskBound;
use optionlab_core::strategy::presets::{self, Quote};
use optionlab_core::{simulate_strategy, EvaluationMode, MarketParameters, PlResult};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn bull_call_spread_result(mode: EvaluationMode) -> PlResult {
    let s = presets::bull_call_spread(
        dec!(180),
        Quote::new(dec!(175), dec!(5)),
        Quote::new(dec!(185), dec!(2)),
        dec!(0.25),
    );
    let m = MarketParameters::new(dec!(180), dec!(0.3), dec!(0.04));
    simulate_strategy(&s, &m, mode).unwrap()
}

#[test]
fn test_header_line() {
    let text = to_csv_string(&bull_call_spread_result(EvaluationMode::Today)).unwrap();
    let first = text.lines().next().unwrap();
    assert_eq!(first, "Price,P/L,P/L%,Delta,Gamma,Theta,Vega");
    assert_eq!(first.split(',').count(), CSV_HEADER.len());
}

#[test]
fn test_round_trip_preserves_grid() {
    let result = bull_call_spread_result(EvaluationMode::Today);
    let rows = parse_csv(&to_csv_string(&result).unwrap()).unwrap();
    assert_eq!(rows.len(), result.price_grid.len());
    for (row, point) in rows.iter().zip(&result.price_grid) {
        assert_eq!(row.price, point.price);
        assert_eq!(row.pl, point.pl);
        assert_eq!(row.pl_percent, point.pl_percent);
        assert_eq!(row.delta, point.greeks.delta);
        assert_eq!(row.gamma, point.greeks.gamma);
        assert_eq!(row.theta, point.greeks.theta);
        assert_eq!(row.vega, point.greeks.vega);
    }
}

#[test]
fn test_summary_matches_at_expiration_result() {
    let result = bull_call_spread_result(EvaluationMode::AtExpiration);
    let mut buf = Vec::new();
    write_csv(&result, &mut buf).unwrap();
    let rows = parse_csv(std::str::from_utf8(&buf).unwrap()).unwrap();
    let summary = summarize_rows(&rows);

    assert_eq!(summary.rows, result.price_grid.len());
    assert_eq!(summary.max_pl.map(RiskBound::Bounded), Some(result.max_profit));
    assert_eq!(summary.min_pl.map(|v| RiskBound::Bounded(-v)), Some(result.max_loss));
    assert_eq!(summary.breakevens, result.breakevens);
}

#[test]
fn test_undefined_percent_written_empty() {
    let s = presets::long_call(dec!(100), Quote::new(dec!(100), dec!(0)), dec!(0.25));
    let m = MarketParameters::new(dec!(100), dec!(0.2), dec!(0.05));
    let result = simulate_strategy(&s, &m, EvaluationMode::Today).unwrap();
    let text = to_csv_string(&result).unwrap();
    let second = text.lines().nth(1).unwrap();
    assert_eq!(second.split(',').nth(2), Some(""));
    let rows = parse_csv(&text).unwrap();
    assert!(rows.iter().all(|r| r.pl_percent.is_none()));
}

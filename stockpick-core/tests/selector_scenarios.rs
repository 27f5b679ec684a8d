//! End-to-end selector scenarios through the public API: config -> factory ->
//! indicator engine -> evaluation.

use chrono::NaiveDate;
use stockpick_core::{
    create_selector, Bar, BarSeries, Condition, IndicatorEngine, StrategyConfig, Verdict,
};

fn bar(i: usize, close: f64, high: f64, low: f64) -> Bar {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    Bar {
        date: base + chrono::Duration::days(i as i64),
        open: close,
        high,
        low,
        close,
        volume: 1_000,
    }
}

/// Closes rise 10 -> 13 over 60 days; a +20 upper wick on the last three bars
/// pulls J far below zero.
fn soft_rebound_series() -> BarSeries {
    let bars = (0..60)
        .map(|i| {
            let c = 10.0 + i as f64 * 3.0 / 59.0;
            let wick = if i >= 57 { 20.0 } else { 0.1 };
            bar(i, c, c + wick, c - 0.1)
        })
        .collect();
    BarSeries::new("600000", bars).unwrap()
}

/// Mouth 12.00, floor 9.00, then flat at 9.20 with four wicked bars at the end.
fn pit_series() -> BarSeries {
    let mut bars = Vec::new();
    for i in 0..20 {
        let c = 10.0 + i as f64 * 2.0 / 19.0;
        bars.push(bar(i, c, c + 0.1, c - 0.1));
    }
    for (k, c) in [11.5, 11.0, 10.5, 10.0, 9.5, 9.0].into_iter().enumerate() {
        bars.push(bar(20 + k, c, c + 0.1, c - 0.1));
    }
    for i in 26..70 {
        let high = if i >= 66 { 29.2 } else { 9.2 };
        bars.push(bar(i, 9.2, high, 9.0));
    }
    BarSeries::new("000001", bars).unwrap()
}

fn evaluate_last(config: &StrategyConfig, series: &BarSeries) -> Verdict {
    let selector = create_selector(config).unwrap();
    let indicators = IndicatorEngine::new(selector.indicator_request()).compute(series.bars());
    selector
        .evaluate(series.bars(), series.len() - 1, &indicators)
        .verdict
}

fn soft_rebound_config() -> StrategyConfig {
    StrategyConfig::new("BBIKDJSelector")
        .with_param("j_threshold", 1.0)
        .with_param("j_q_threshold", 0.10)
        .with_param("bbi_min_window", 20.0)
        .with_param("max_window", 60.0)
        .with_param("price_range_pct", 0.5)
        .with_param("bbi_q_threshold", 0.1)
}

fn pit_config() -> StrategyConfig {
    StrategyConfig::new("PeakKDJSelector")
        .with_param("j_threshold", 10.0)
        .with_param("j_q_threshold", 0.10)
        .with_param("max_window", 60.0)
        .with_param("fluc_threshold", 0.03)
        .with_param("gap_threshold", 0.2)
}

#[test]
fn soft_rebound_scenario_matches() {
    assert_eq!(
        evaluate_last(&soft_rebound_config(), &soft_rebound_series()),
        Verdict::Matched
    );
}

#[test]
fn soft_rebound_rejects_when_range_ceiling_is_tighter() {
    let config = soft_rebound_config().with_param("price_range_pct", 0.25);
    assert_eq!(
        evaluate_last(&config, &soft_rebound_series()),
        Verdict::Rejected(Condition::PriceRange)
    );
}

#[test]
fn fill_the_pit_scenario_matches() {
    assert_eq!(evaluate_last(&pit_config(), &pit_series()), Verdict::Matched);
}

#[test]
fn fill_the_pit_needs_deep_enough_pit() {
    let config = pit_config().with_param("gap_threshold", 0.4);
    assert_eq!(
        evaluate_last(&config, &pit_series()),
        Verdict::Rejected(Condition::PitMouth)
    );
}

#[test]
fn every_date_of_a_short_series_is_insufficient() {
    let series = soft_rebound_series();
    let selector = create_selector(&StrategyConfig::new("bbi_kdj")).unwrap();
    let indicators = IndicatorEngine::new(selector.indicator_request()).compute(series.bars());
    for t in 0..series.len() {
        let eval = selector.evaluate(series.bars(), t, &indicators);
        assert!(matches!(
            eval.verdict,
            Verdict::InsufficientHistory { required: 113, .. }
        ));
    }
}

#[test]
fn evaluation_state_explains_the_decision() {
    let series = soft_rebound_series();
    let selector = create_selector(&soft_rebound_config()).unwrap();
    let indicators = IndicatorEngine::new(selector.indicator_request()).compute(series.bars());
    let eval = selector.evaluate(series.bars(), 59, &indicators);
    for key in ["j", "j_rank", "price_range", "bbi_uptrend"] {
        assert!(eval.state.contains_key(key), "missing {key}");
    }
}

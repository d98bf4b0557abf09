//! End-to-end backtests: raw quotes → enrichment → strategies from specs → trades → report.

use chrono::NaiveDate;
use edgelab_core::backtest::{backtest_stock, BacktestOptions, NO_EXIT_SIGNAL};
use edgelab_core::domain::{
    BreadthContext, BreadthPoint, Earning, RawQuote, Stock,
};
use edgelab_core::factory::{build_entry_strategy, build_exit_strategy, StrategySpec};
use edgelab_core::registry::StrategyRegistry;
use edgelab_core::report::BacktestReport;

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn day(offset: i64) -> NaiveDate {
    base() + chrono::Duration::days(offset)
}

fn raw_from_closes(closes: &[f64]) -> Vec<RawQuote> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| RawQuote {
            symbol: "E2E".into(),
            date: day(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10_000,
        })
        .collect()
}

fn predefined(name: &str) -> StrategySpec {
    StrategySpec::Predefined { name: name.into() }
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn always_entry_two_bar_hold() {
    let stock = Stock::from_raw("E2E", &raw_from_closes(&[100.0, 105.0, 103.0, 110.0, 108.0])).unwrap();
    let entry = build_entry_strategy(&predefined("always")).unwrap();
    let exit = build_exit_strategy(&predefined("two_bar_hold")).unwrap();

    let trades = backtest_stock(&stock, &entry, &exit, &BacktestOptions::default(), None);

    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.entry_date(), day(0));
    assert_eq!(t.exit_date(), day(2));
    assert_eq!(t.exit.close, 103.0);
    assert!((t.profit_pct() - 3.0).abs() < 1e-9);
    assert_eq!(t.trading_days(), 2);
    assert_eq!(t.exit_reason, "Time exit after 1 bars");

    let report = BacktestReport::new(trades);
    assert_eq!(report.win_rate, 1.0);
    assert!((report.edge - 3.0).abs() < 1e-9);
}

#[test]
fn custom_spec_from_json() {
    let entry_json = r#"{
        "type": "CUSTOM",
        "conditions": [{"type": "minimumPrice", "params": {"price": 104}}]
    }"#;
    let exit_json = r#"{
        "type": "CUSTOM",
        "conditions": [{"type": "never"}]
    }"#;
    let entry = build_entry_strategy(&serde_json::from_str(entry_json).unwrap()).unwrap();
    let exit = build_exit_strategy(&serde_json::from_str(exit_json).unwrap()).unwrap();

    let stock = Stock::from_raw("E2E", &raw_from_closes(&[100.0, 105.0, 103.0, 110.0, 108.0])).unwrap();
    let trades = backtest_stock(&stock, &entry, &exit, &BacktestOptions::default(), None);

    // 105 → 103 via fallback; 110 → 108 via fallback
    assert_eq!(trades.len(), 2);
    assert!(trades.iter().all(|t| t.exit_reason == NO_EXIT_SIGNAL));
    assert!(trades.iter().all(|t| !t.is_winner()));
}

#[test]
fn breadth_conditions_need_context() {
    let stock = Stock::from_raw("E2E", &raw_from_closes(&[10.0, 11.0, 12.0, 13.0]))
        .unwrap()
        .with_sector("XLK");
    let spec: StrategySpec = serde_json::from_str(
        r#"{"type": "CUSTOM", "conditions": [{"type": "market_uptrend"}, {"type": "sector_uptrend"}]}"#,
    )
    .unwrap();
    let entry = build_entry_strategy(&spec).unwrap();
    let exit = StrategyRegistry::exit("two_bar_hold").unwrap();
    let options = BacktestOptions::default();

    assert!(backtest_stock(&stock, &entry, &exit, &options, None).is_empty());

    let mut breadth = BreadthContext::new();
    breadth.insert_market(day(0), BreadthPoint::new(60.0, 50.0));
    breadth.insert_sector("XLK", day(0), BreadthPoint::new(70.0, 55.0));
    let trades = backtest_stock(&stock, &entry, &exit, &options, Some(&breadth));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].entry_date(), day(0));
    assert_eq!(trades[0].sector.as_deref(), Some("XLK"));
}

#[test]
fn earnings_block_entries() {
    let stock = Stock::from_raw("E2E", &raw_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]))
        .unwrap()
        .with_earnings(vec![Earning {
            fiscal_date_ending: day(-30),
            reported_date: Some(day(3)),
        }]);
    let spec: StrategySpec = serde_json::from_str(
        r#"{"type": "CUSTOM", "conditions": [{"type": "no_earnings_within_days", "params": {"days": 1}}]}"#,
    )
    .unwrap();
    let entry = build_entry_strategy(&spec).unwrap();
    let candidates = edgelab_core::backtest::entry_candidates(
        &stock,
        &entry,
        &BacktestOptions::default().window,
        None,
    );
    // day 2 and day 3 are within one calendar day of the report
    assert_eq!(candidates, vec![0, 1, 4]);
}

#[test]
fn multi_year_report() {
    let closes: Vec<f64> = (0..800).map(|i| 50.0 + (i as f64 * 0.1).sin() * 5.0 + i as f64 * 0.02).collect();
    let stock = Stock::from_raw("E2E", &raw_from_closes(&closes)).unwrap();
    let entry = StrategyRegistry::entry("always").unwrap();
    let exit = StrategyRegistry::exit("two_bar_hold").unwrap();

    let report = BacktestReport::new(backtest_stock(
        &stock,
        &entry,
        &exit,
        &BacktestOptions::default(),
        None,
    ));
    let years = report.by_year();
    assert_eq!(years.keys().copied().collect::<Vec<_>>(), vec![2024, 2025, 2026]);
    let total: usize = years.values().map(|p| p.trades).sum();
    assert_eq!(total, report.total_trades);
    assert_eq!(report.stock_performance().len(), 1);
}

//! Criterion benchmarks for EdgeLab hot paths.
//!
//! Run with: `cargo bench -p edgelab-runner`
//!
//! Benchmarks:
//! 1. Scenario generation per technique (sequential and pooled)
//! 2. Statistics over a scenario batch
//! 3. Multi-stock backtest fan-out

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::NaiveDate;
use edgelab_core::domain::{RawQuote, Stock, Trade};
use edgelab_core::factory::StrategySpec;
use edgelab_core::rng::RngHierarchy;
use edgelab_runner::montecarlo::{generate_scenarios, SimulationTechnique, Technique};
use edgelab_runner::{run_backtest, BacktestRequest, MonteCarloStatistics};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_raw_quotes(symbol: &str, n: usize, phase: f64) -> Vec<RawQuote> {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1 + phase).sin() * 10.0 + i as f64 * 0.02;
            RawQuote {
                symbol: symbol.into(),
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}

fn make_universe(stocks: usize, bars: usize) -> Vec<Stock> {
    (0..stocks)
        .map(|s| {
            let symbol = format!("S{s:03}");
            Stock::from_raw(&symbol, &make_raw_quotes(&symbol, bars, s as f64)).unwrap()
        })
        .collect()
}

fn make_trades(n: usize) -> Vec<Trade> {
    let request = BacktestRequest::new(
        StrategySpec::Predefined { name: "always".into() },
        StrategySpec::Predefined { name: "two_bar_hold".into() },
    );
    let stock = make_universe(1, n * 3 + 1);
    let mut trades = run_backtest(&stock, &request, None, None).unwrap().trades;
    trades.truncate(n);
    trades
}

// ── Monte Carlo ──────────────────────────────────────────────────────

fn bench_generate_scenarios(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_scenarios");
    group.sample_size(20);
    let trades = make_trades(200);
    let rng = RngHierarchy::new(42);

    for technique in Technique::all() {
        for threads in [1usize, 0] {
            let id = format!("{}/threads={threads}", technique.implementation().name());
            group.bench_with_input(BenchmarkId::from_parameter(id), &threads, |b, &threads| {
                b.iter(|| {
                    generate_scenarios(
                        black_box(&trades),
                        technique.implementation(),
                        1_000,
                        &rng,
                        threads,
                        None,
                    )
                    .unwrap()
                });
            });
        }
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let trades = make_trades(100);

    for iterations in [1_000usize, 10_000] {
        let batch = generate_scenarios(
            &trades,
            Technique::BootstrapResampling.implementation(),
            iterations,
            &RngHierarchy::new(7),
            0,
            None,
        )
        .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &batch.scenarios,
            |b, scenarios| {
                b.iter(|| MonteCarloStatistics::from_scenarios(black_box(scenarios)));
            },
        );
    }

    group.finish();
}

// ── Backtest ─────────────────────────────────────────────────────────

fn bench_backtest_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest_fan_out");
    group.sample_size(10);
    let universe = make_universe(50, 1_000);

    for threads in [1usize, 0] {
        let mut request = BacktestRequest::new(
            StrategySpec::Predefined { name: "trend_following".into() },
            StrategySpec::Predefined { name: "trend_exit".into() },
        );
        request.threads = threads;
        group.bench_with_input(BenchmarkId::from_parameter(threads), &request, |b, req| {
            b.iter(|| run_backtest(black_box(&universe), req, None, None).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_generate_scenarios,
    bench_statistics,
    bench_backtest_fan_out,
);
criterion_main!(benches);

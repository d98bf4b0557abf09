//! Monte Carlo simulation over a backtest's trades.
//!
//! Each iteration draws a trade sequence with the configured technique,
//! compounds it into an equity curve, and the scenario set is reduced to
//! distributional statistics.
//!
//! Iteration `i` is seeded from `blake3(master_seed, technique name, i)`, so a
//! seeded run replays bit-identically at any thread count. Unseeded runs draw a
//! master seed once and report it in the result.

mod scenario;
mod technique;

pub use scenario::{compound_return_pct, max_drawdown_pct, EquityPoint, Scenario};
pub use technique::{BootstrapResampling, SimulationTechnique, Technique, TradeShuffling};

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use edgelab_core::domain::Trade;
use edgelab_core::report::EdgeStats;
use edgelab_core::rng::RngHierarchy;

use crate::parallel::fan_out;
use crate::statistics::{MonteCarloStatistics, PercentileEquityCurves};

// ─── Configuration ───────────────────────────────────────────────────

pub const DEFAULT_ITERATIONS: usize = 10_000;

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default)]
    pub technique: Technique,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Master seed; `None` draws one from the OS-backed thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Keep every scenario in the result, not just the statistics.
    #[serde(default)]
    pub include_all_scenarios: bool,
    /// 0 = rayon default pool, 1 = sequential.
    #[serde(default)]
    pub threads: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            technique: Technique::default(),
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            include_all_scenarios: false,
            threads: 0,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.iterations == 0 {
            return Err(SimulationError::ZeroIterations);
        }
        Ok(())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Scenario generation ─────────────────────────────────────────────

/// Scenarios in scenario-number order, plus whether the run stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBatch {
    pub scenarios: Vec<Scenario>,
    pub cancelled: bool,
}

/// Run `iterations` independent draws of `technique` over `trades`.
///
/// An empty trade list yields no scenarios. Cancellation stops new
/// iterations; scenarios already built are kept.
pub fn generate_scenarios(
    trades: &[Trade],
    technique: &dyn SimulationTechnique,
    iterations: usize,
    rng: &RngHierarchy,
    threads: usize,
    cancel: Option<&AtomicBool>,
) -> Result<ScenarioBatch, SimulationError> {
    if trades.is_empty() {
        return Ok(ScenarioBatch {
            scenarios: Vec::new(),
            cancelled: false,
        });
    }

    let numbers: Vec<usize> = (1..=iterations).collect();
    let results = fan_out(&numbers, threads, cancel, |&n| {
        let mut iter_rng = rng.rng_for(technique.name(), n as u64);
        let order = technique.sample(trades.len(), &mut iter_rng);
        Scenario::build(n, trades, order)
    })?;

    let scenarios: Vec<Scenario> = results.into_iter().flatten().collect();
    let cancelled = scenarios.len() < iterations;
    debug!(
        technique = technique.name(),
        requested = iterations,
        completed = scenarios.len(),
        "generated scenarios"
    );
    Ok(ScenarioBatch {
        scenarios,
        cancelled,
    })
}

// ─── Full run ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub technique: Technique,
    pub technique_name: String,
    pub technique_description: String,
    /// Iterations requested.
    pub iterations: usize,
    /// Scenarios actually built; below `iterations` when the run was
    /// cancelled or there were no trades.
    pub completed_scenarios: usize,
    pub seed: u64,
    pub statistics: MonteCarloStatistics,
    pub percentile_equity_curves: PercentileEquityCurves,
    /// Present only when `include_all_scenarios` was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<Scenario>>,
    /// Compounded in the original entry order.
    pub original_return_pct: f64,
    pub original_edge: f64,
    /// Fraction in [0, 1].
    pub original_win_rate: f64,
    pub execution_time_ms: u64,
    pub cancelled: bool,
}

/// Simulate `trades` per `config` and summarize the scenarios.
pub fn run_monte_carlo(
    trades: &[Trade],
    config: &MonteCarloConfig,
    cancel: Option<&AtomicBool>,
) -> Result<MonteCarloResult, SimulationError> {
    config.validate()?;
    let start = Instant::now();
    let rng = config
        .seed
        .map_or_else(RngHierarchy::from_entropy, RngHierarchy::new);
    let technique = config.technique.implementation();

    info!(
        technique = technique.name(),
        trades = trades.len(),
        iterations = config.iterations,
        seed = rng.master_seed(),
        "monte carlo started"
    );

    let batch = generate_scenarios(
        trades,
        technique,
        config.iterations,
        &rng,
        config.threads,
        cancel,
    )?;
    if batch.cancelled {
        warn!(
            completed = batch.scenarios.len(),
            requested = config.iterations,
            "monte carlo cancelled"
        );
    }

    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.entry_date());
    let original = EdgeStats::from_trades(trades);

    let result = MonteCarloResult {
        technique: config.technique,
        technique_name: technique.name().to_string(),
        technique_description: technique.description().to_string(),
        iterations: config.iterations,
        completed_scenarios: batch.scenarios.len(),
        seed: rng.master_seed(),
        statistics: MonteCarloStatistics::from_scenarios(&batch.scenarios),
        percentile_equity_curves: PercentileEquityCurves::from_scenarios(&batch.scenarios),
        original_return_pct: compound_return_pct(ordered.iter().map(|t| t.profit_pct())),
        original_edge: original.edge,
        original_win_rate: original.win_rate,
        execution_time_ms: start.elapsed().as_millis() as u64,
        cancelled: batch.cancelled,
        scenarios: config.include_all_scenarios.then_some(batch.scenarios),
    };

    info!(
        scenarios = result.completed_scenarios,
        median_return = result.statistics.total_return_pct.median,
        probability_of_profit = result.statistics.probability_of_profit,
        elapsed_ms = result.execution_time_ms,
        "monte carlo finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trades_with_pcts;

    fn config(technique: Technique, iterations: usize, seed: u64) -> MonteCarloConfig {
        MonteCarloConfig {
            technique,
            iterations,
            seed: Some(seed),
            include_all_scenarios: true,
            threads: 1,
        }
    }

    #[test]
    fn zero_iterations_rejected() {
        let err = run_monte_carlo(&[], &config(Technique::TradeShuffling, 0, 1), None);
        assert!(matches!(err, Err(SimulationError::ZeroIterations)));
    }

    #[test]
    fn empty_trades_give_empty_result() {
        let r = run_monte_carlo(&[], &config(Technique::BootstrapResampling, 100, 1), None).unwrap();
        assert_eq!(r.iterations, 100);
        assert_eq!(r.completed_scenarios, 0);
        assert_eq!(r.scenarios, Some(vec![]));
        assert_eq!(r.statistics, MonteCarloStatistics::default());
        assert!(!r.cancelled);
    }

    #[test]
    fn scenarios_are_numbered_in_order() {
        let trades = trades_with_pcts(&[1.0, -2.0, 3.0]);
        let r = run_monte_carlo(&trades, &config(Technique::TradeShuffling, 25, 9), None).unwrap();
        let numbers: Vec<usize> = r.scenarios.unwrap().iter().map(|s| s.scenario_number).collect();
        assert_eq!(numbers, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn shuffling_preserves_total_return() {
        let trades = trades_with_pcts(&[10.0, -10.0, 5.0, -3.0]);
        let r = run_monte_carlo(&trades, &config(Technique::TradeShuffling, 50, 3), None).unwrap();
        for s in r.scenarios.unwrap() {
            assert!((s.total_return_pct - r.original_return_pct).abs() < 1e-9);
            assert!((s.edge - r.original_edge).abs() < 1e-9);
        }
    }

    #[test]
    fn scenarios_omitted_unless_requested() {
        let trades = trades_with_pcts(&[1.0]);
        let mut c = config(Technique::TradeShuffling, 5, 1);
        c.include_all_scenarios = false;
        let r = run_monte_carlo(&trades, &c, None).unwrap();
        assert!(r.scenarios.is_none());
        assert_eq!(r.iterations, 5);
        assert_eq!(r.completed_scenarios, 5);
    }

    #[test]
    fn pre_raised_cancel_flag() {
        let trades = trades_with_pcts(&[1.0, 2.0]);
        let flag = AtomicBool::new(true);
        let r = run_monte_carlo(&trades, &config(Technique::TradeShuffling, 10, 1), Some(&flag)).unwrap();
        assert!(r.cancelled);
        assert_eq!(r.iterations, 10);
        assert_eq!(r.completed_scenarios, 0);
    }

    #[test]
    fn unseeded_run_reports_its_seed() {
        let trades = trades_with_pcts(&[4.0, -1.0, 2.0]);
        let mut c = config(Technique::BootstrapResampling, 20, 0);
        c.seed = None;
        let first = run_monte_carlo(&trades, &c, None).unwrap();

        c.seed = Some(first.seed);
        let replay = run_monte_carlo(&trades, &c, None).unwrap();
        assert_eq!(first.scenarios, replay.scenarios);
    }

    #[test]
    fn config_defaults() {
        let c: MonteCarloConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, MonteCarloConfig::default());
        assert_eq!(c.iterations, 10_000);
        assert_eq!(c.technique, Technique::TradeShuffling);
    }
}

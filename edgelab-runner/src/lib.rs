//! EdgeLab Runner: multi-stock backtests, Monte Carlo simulation, edge statistics.
//!
//! This crate builds on `edgelab-core` to provide:
//! - Serializable run configuration loaded from TOML
//! - Parallel per-stock backtest fan-out with cooperative cancellation
//! - Monte Carlo simulation (trade shuffling, bootstrap resampling)
//! - Distributional statistics and percentile equity curves
//! - The year-over-year edge consistency score, overall and per sector

pub mod backtest;
pub mod config;
pub mod edge_consistency;
pub mod montecarlo;
mod parallel;
pub mod statistics;

pub use backtest::{run_backtest, BacktestError};
pub use config::{BacktestRequest, ConfigError, RunConfig};
pub use edge_consistency::{EdgeConsistencyScore, Interpretation, SectorConsistency};
pub use montecarlo::{
    generate_scenarios, run_monte_carlo, MonteCarloConfig, MonteCarloResult, Scenario,
    SimulationError, SimulationTechnique, Technique,
};
pub use statistics::{
    percentile_sorted, ConfidenceInterval, Distribution, MonteCarloStatistics,
    PercentileEquityCurves,
};

//! Distributional summaries over Monte Carlo scenarios.
//!
//! Percentiles interpolate linearly on the sorted sample at rank
//! `p / 100 * (n - 1)`. Empty samples summarize to zeros.

use serde::{Deserialize, Serialize};

use crate::montecarlo::Scenario;

/// Compute percentile from a sorted slice (linear interpolation).
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_values(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let s = sorted(values);
        let n = s.len() as f64;
        let mean = s.iter().sum::<f64>() / n;
        let var = s.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            median: percentile_sorted(&s, 50.0),
            std_dev: var.sqrt(),
            p5: percentile_sorted(&s, 5.0),
            p25: percentile_sorted(&s, 25.0),
            p50: percentile_sorted(&s, 50.0),
            p75: percentile_sorted(&s, 75.0),
            p95: percentile_sorted(&s, 95.0),
            min: s[0],
            max: s[s.len() - 1],
        }
    }
}

/// Two-sided interval from the 2.5th to the 97.5th percentile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn ci95(values: Vec<f64>) -> Self {
        let s = sorted(values);
        Self {
            lower: percentile_sorted(&s, 2.5),
            upper: percentile_sorted(&s, 97.5),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloStatistics {
    pub scenarios: usize,
    pub total_return_pct: Distribution,
    pub max_drawdown_pct: Distribution,
    pub win_rate: Distribution,
    pub edge: Distribution,
    pub return_ci_95: ConfidenceInterval,
    pub drawdown_ci_95: ConfidenceInterval,
    /// Fraction of scenarios with a positive total return, in [0, 1].
    pub probability_of_profit: f64,
    /// 95th percentile of total return.
    pub best_case_return_pct: f64,
    /// 5th percentile of total return.
    pub worst_case_return_pct: f64,
}

impl MonteCarloStatistics {
    pub fn from_scenarios(scenarios: &[Scenario]) -> Self {
        if scenarios.is_empty() {
            return Self::default();
        }
        let returns: Vec<f64> = scenarios.iter().map(|s| s.total_return_pct).collect();
        let drawdowns: Vec<f64> = scenarios.iter().map(|s| s.max_drawdown_pct).collect();
        let profitable = returns.iter().filter(|r| **r > 0.0).count();

        let total_return_pct = Distribution::from_values(returns.clone());
        Self {
            scenarios: scenarios.len(),
            probability_of_profit: profitable as f64 / scenarios.len() as f64,
            best_case_return_pct: total_return_pct.p95,
            worst_case_return_pct: total_return_pct.p5,
            return_ci_95: ConfidenceInterval::ci95(returns),
            drawdown_ci_95: ConfidenceInterval::ci95(drawdowns.clone()),
            total_return_pct,
            max_drawdown_pct: Distribution::from_values(drawdowns),
            win_rate: Distribution::from_values(scenarios.iter().map(|s| s.win_rate).collect()),
            edge: Distribution::from_values(scenarios.iter().map(|s| s.edge).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    /// 1-based trade position.
    pub trade_number: usize,
    pub cumulative_return_pct: f64,
}

/// Pointwise percentile paths across scenarios.
///
/// The p50 curve is the median at each trade position, not any single
/// scenario's path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileEquityCurves {
    pub p5: Vec<PercentilePoint>,
    pub p25: Vec<PercentilePoint>,
    pub p50: Vec<PercentilePoint>,
    pub p75: Vec<PercentilePoint>,
    pub p95: Vec<PercentilePoint>,
}

impl PercentileEquityCurves {
    pub fn from_scenarios(scenarios: &[Scenario]) -> Self {
        let longest = scenarios
            .iter()
            .map(|s| s.equity_curve.len())
            .max()
            .unwrap_or(0);
        let mut curves = Self::default();
        for idx in 0..longest {
            let column = sorted(
                scenarios
                    .iter()
                    .filter_map(|s| s.equity_curve.get(idx))
                    .map(|p| p.cumulative_return_pct)
                    .collect(),
            );
            let point = |p: f64| PercentilePoint {
                trade_number: idx + 1,
                cumulative_return_pct: percentile_sorted(&column, p),
            };
            curves.p5.push(point(5.0));
            curves.p25.push(point(25.0));
            curves.p50.push(point(50.0));
            curves.p75.push(point(75.0));
            curves.p95.push(point(95.0));
        }
        curves
    }

    pub fn len(&self) -> usize {
        self.p50.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p50.is_empty()
    }
}

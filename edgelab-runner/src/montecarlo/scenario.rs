//! One simulated trade sequence and its compounded equity curve.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use edgelab_core::domain::Trade;
use edgelab_core::report::EdgeStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Exit date of the trade that produced this point.
    pub date: NaiveDate,
    pub cumulative_return_pct: f64,
    /// 1-based position in the scenario.
    pub trade_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 1-based.
    pub scenario_number: usize,
    pub equity_curve: Vec<EquityPoint>,
    /// Indices into the original trade list, in the order they were applied.
    pub trade_indices: Vec<usize>,
    pub total_return_pct: f64,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub edge: f64,
    pub max_drawdown_pct: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

/// Compound percentage returns geometrically; the result is a percentage.
pub fn compound_return_pct(returns: impl IntoIterator<Item = f64>) -> f64 {
    let multiplier = returns
        .into_iter()
        .fold(1.0, |m, r| m * (1.0 + r / 100.0));
    (multiplier - 1.0) * 100.0
}

/// Largest peak-to-trough decline of an equity curve, in percent of the peak.
///
/// The curve starts at equity 1.0 before the first point.
pub fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for p in curve {
        let equity = 1.0 + p.cumulative_return_pct / 100.0;
        peak = peak.max(equity);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak * 100.0);
        }
    }
    max_dd
}

impl Scenario {
    /// Apply `trade_indices` of `trades` in order.
    ///
    /// Indices must be in range for `trades`.
    pub fn build(scenario_number: usize, trades: &[Trade], trade_indices: Vec<usize>) -> Self {
        let mut multiplier = 1.0;
        let equity_curve: Vec<EquityPoint> = trade_indices
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let trade = &trades[i];
                multiplier *= 1.0 + trade.profit_pct() / 100.0;
                EquityPoint {
                    date: trade.exit_date(),
                    cumulative_return_pct: (multiplier - 1.0) * 100.0,
                    trade_number: pos + 1,
                }
            })
            .collect();

        let stats = EdgeStats::from_trades(trade_indices.iter().map(|&i| &trades[i]));
        Self {
            scenario_number,
            total_return_pct: equity_curve.last().map_or(0.0, |p| p.cumulative_return_pct),
            max_drawdown_pct: max_drawdown_pct(&equity_curve),
            win_rate: stats.win_rate,
            edge: stats.edge,
            winning_trades: stats.wins,
            losing_trades: stats.losses,
            equity_curve,
            trade_indices,
        }
    }
}

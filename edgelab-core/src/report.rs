//! Backtest report: aggregates over a trade list.
//!
//! Every rate is guarded against empty buckets: no trades means zero rates
//! and zero edge, never NaN.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::domain::{Excursion, Trade};

/// Expected profit percentage per trade.
///
/// `win_rate` is a fraction in [0, 1]; `avg_loss_pct` is a magnitude.
pub fn edge(win_rate: f64, avg_win_pct: f64, avg_loss_pct: f64) -> f64 {
    avg_win_pct * win_rate - (1.0 - win_rate) * avg_loss_pct
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Win/loss split over any sequence of trade returns (in percent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeStats {
    pub wins: usize,
    pub losses: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub avg_win_pct: f64,
    /// Absolute value.
    pub avg_loss_pct: f64,
    pub edge: f64,
}

impl EdgeStats {
    /// A return above zero is a win; zero or below is a loss.
    pub fn from_returns(returns: impl IntoIterator<Item = f64>) -> Self {
        Self::from_outcomes(returns.into_iter().map(|r| (r > 0.0, r)))
    }

    /// Classifies with [`Trade::is_winner`] so counts agree with
    /// [`BacktestReport::winning_trades`].
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        Self::from_outcomes(trades.into_iter().map(|t| (t.is_winner(), t.profit_pct())))
    }

    fn from_outcomes(outcomes: impl Iterator<Item = (bool, f64)>) -> Self {
        let (mut win_sum, mut loss_sum) = (0.0, 0.0);
        let (mut wins, mut losses) = (0usize, 0usize);
        for (won, r) in outcomes {
            if won {
                wins += 1;
                win_sum += r;
            } else {
                losses += 1;
                loss_sum += r.abs();
            }
        }
        let total = wins + losses;
        if total == 0 {
            return Self::default();
        }
        let win_rate = wins as f64 / total as f64;
        let avg_win_pct = if wins > 0 { win_sum / wins as f64 } else { 0.0 };
        let avg_loss_pct = if losses > 0 { loss_sum / losses as f64 } else { 0.0 };
        Self {
            wins,
            losses,
            win_rate,
            avg_win_pct,
            avg_loss_pct,
            edge: edge(win_rate, avg_win_pct, avg_loss_pct),
        }
    }

    pub fn total(&self) -> usize {
        self.wins + self.losses
    }
}

fn profit_factor<'a>(trades: impl Iterator<Item = &'a Trade>) -> Option<f64> {
    let (gross_win, gross_loss) = trades.fold((0.0, 0.0), |(w, l), t| {
        if t.is_winner() {
            (w + t.profit_pct(), l)
        } else {
            (w, l + t.profit_pct().abs())
        }
    });
    (gross_loss > 0.0).then(|| gross_win / gross_loss)
}

fn share_pct(hits: usize, of: usize) -> f64 {
    if of == 0 {
        0.0
    } else {
        hits as f64 / of as f64 * 100.0
    }
}

fn count_reasons<'a>(trades: impl Iterator<Item = &'a Trade>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for t in trades {
        *counts.entry(t.exit_reason.clone()).or_insert(0) += 1;
    }
    counts
}

/// Deepest peak-to-trough fall, in percent, of the equity curve built by
/// compounding the trades' returns in entry order. Starts from 1.0.
fn max_drawdown_pct<'a>(trades: impl Iterator<Item = &'a Trade>) -> f64 {
    let mut ordered: Vec<&Trade> = trades.collect();
    ordered.sort_by_key(|t| t.entry_date());
    let (mut equity, mut peak, mut worst) = (1.0_f64, 1.0_f64, 0.0_f64);
    for t in ordered {
        equity *= 1.0 + t.profit_pct() / 100.0;
        peak = peak.max(equity);
        if peak > 0.0 {
            worst = worst.max((peak - equity) / peak * 100.0);
        }
    }
    worst
}

// ─── Period and per-stock breakdowns ────────────────────────────────

/// Aggregates over the trades entered in one calendar period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub trades: usize,
    /// Percentage in [0, 100].
    pub win_rate: f64,
    pub avg_profit_pct: f64,
    pub avg_holding_days: f64,
    pub edge: f64,
    pub exit_reasons: BTreeMap<String, usize>,
}

impl PeriodStats {
    pub fn from_trades(trades: &[&Trade]) -> Self {
        let stats = EdgeStats::from_trades(trades.iter().copied());
        Self {
            trades: trades.len(),
            win_rate: stats.win_rate * 100.0,
            avg_profit_pct: mean(trades.iter().map(|t| t.profit_pct())),
            avg_holding_days: mean(trades.iter().map(|t| t.trading_days() as f64)),
            edge: stats.edge,
            exit_reasons: count_reasons(trades.iter().copied()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPerformance {
    pub symbol: String,
    pub trades: usize,
    /// Percentage in [0, 100].
    pub win_rate: f64,
    pub avg_profit_pct: f64,
    pub edge: f64,
    pub profit_factor: Option<f64>,
    /// Simple sum of per-trade returns.
    pub total_profit_pct: f64,
    pub avg_holding_days: f64,
    /// Compounded, in entry order.
    pub max_drawdown_pct: f64,
}

/// Aggregates over every trade of one sector.
///
/// Trades without a sector are grouped under [`SectorStats::UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorStats {
    pub sector: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub avg_win_pct: f64,
    /// Absolute value.
    pub avg_loss_pct: f64,
    pub edge: f64,
    /// Simple sum of per-trade returns.
    pub total_profit_pct: f64,
    /// Compounded, in entry order.
    pub max_drawdown_pct: f64,
    /// Per entry year, the input of a per-sector consistency score.
    pub yearly: BTreeMap<i32, PeriodStats>,
}

impl SectorStats {
    pub const UNKNOWN: &'static str = "UNKNOWN";

    fn from_trades(sector: String, trades: &[&Trade]) -> Self {
        let stats = EdgeStats::from_trades(trades.iter().copied());
        let mut years: BTreeMap<i32, Vec<&Trade>> = BTreeMap::new();
        for &t in trades {
            years.entry(t.entry_date().year()).or_default().push(t);
        }
        Self {
            sector,
            trades: trades.len(),
            wins: stats.wins,
            losses: stats.losses,
            win_rate: stats.win_rate,
            avg_win_pct: stats.avg_win_pct,
            avg_loss_pct: stats.avg_loss_pct,
            edge: stats.edge,
            total_profit_pct: trades.iter().map(|t| t.profit_pct()).sum(),
            max_drawdown_pct: max_drawdown_pct(trades.iter().copied()),
            yearly: years
                .into_iter()
                .map(|(y, ts)| (y, PeriodStats::from_trades(&ts)))
                .collect(),
        }
    }
}

/// How far trades ran for and against the position before exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcursionSummary {
    pub total_trades: usize,
    pub avg_mfe_pct: f64,
    pub avg_mae_pct: f64,
    pub avg_mfe_atr: f64,
    pub avg_mae_atr: f64,
    /// Percentage of trades that were in profit at some close.
    pub profit_reach_rate: f64,
    /// Winners' final profit as a percentage of their MFE.
    pub avg_mfe_efficiency: f64,

    pub winning_trades: usize,
    pub avg_winner_mfe_pct: f64,
    pub avg_winner_mae_pct: f64,
    pub avg_winner_profit_pct: f64,

    pub losing_trades: usize,
    pub avg_loser_mfe_pct: f64,
    pub avg_loser_mae_pct: f64,
    pub avg_loser_loss_pct: f64,
    /// Percentage of losers that were in profit at some close.
    pub loser_missed_win_rate: f64,
}

impl ExcursionSummary {
    pub fn from_trades(trades: &[Trade]) -> Option<Self> {
        if trades.is_empty() {
            return None;
        }
        let rows: Vec<(&Trade, Excursion)> = trades.iter().map(|t| (t, t.excursion())).collect();
        let (winners, losers): (Vec<_>, Vec<_>) = rows.iter().partition(|(t, _)| t.is_winner());
        let reached = rows.iter().filter(|(_, e)| e.mfe_reached).count();
        let losers_reached = losers.iter().filter(|(_, e)| e.mfe_reached).count();
        Some(Self {
            total_trades: rows.len(),
            avg_mfe_pct: mean(rows.iter().map(|(_, e)| e.mfe_pct)),
            avg_mae_pct: mean(rows.iter().map(|(_, e)| e.mae_pct)),
            avg_mfe_atr: mean(rows.iter().map(|(_, e)| e.mfe_atr)),
            avg_mae_atr: mean(rows.iter().map(|(_, e)| e.mae_atr)),
            profit_reach_rate: share_pct(reached, rows.len()),
            avg_mfe_efficiency: mean(winners.iter().map(|(t, e)| {
                if e.mfe_pct > 0.0 {
                    t.profit_pct() / e.mfe_pct * 100.0
                } else {
                    0.0
                }
            })),
            winning_trades: winners.len(),
            avg_winner_mfe_pct: mean(winners.iter().map(|(_, e)| e.mfe_pct)),
            avg_winner_mae_pct: mean(winners.iter().map(|(_, e)| e.mae_pct)),
            avg_winner_profit_pct: mean(winners.iter().map(|(t, _)| t.profit_pct())),
            losing_trades: losers.len(),
            avg_loser_mfe_pct: mean(losers.iter().map(|(_, e)| e.mfe_pct)),
            avg_loser_mae_pct: mean(losers.iter().map(|(_, e)| e.mae_pct)),
            avg_loser_loss_pct: mean(losers.iter().map(|(t, _)| t.profit_pct())),
            loser_missed_win_rate: share_pct(losers_reached, losers.len()),
        })
    }
}

// ─── BacktestReport ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Sorted by entry date, then symbol.
    pub trades: Vec<Trade>,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub loss_rate: f64,
    pub average_win_amount: f64,
    pub average_win_percent: f64,
    pub average_loss_amount: f64,
    /// Absolute value.
    pub average_loss_percent: f64,
    pub edge: f64,
    pub total_trades: usize,
    pub profit_factor: Option<f64>,
    pub exit_reason_counts: BTreeMap<String, usize>,
}

impl BacktestReport {
    pub fn new(mut trades: Vec<Trade>) -> Self {
        trades.sort_by(|a, b| {
            a.entry_date()
                .cmp(&b.entry_date())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        let stats = EdgeStats::from_trades(&trades);
        let loss_rate = if trades.is_empty() { 0.0 } else { 1.0 - stats.win_rate };
        let average_win_amount = mean(trades.iter().filter(|t| t.is_winner()).map(|t| t.profit));
        let average_loss_amount =
            mean(trades.iter().filter(|t| !t.is_winner()).map(|t| t.profit.abs()));
        Self {
            win_rate: stats.win_rate,
            loss_rate,
            average_win_amount,
            average_win_percent: stats.avg_win_pct,
            average_loss_amount,
            average_loss_percent: stats.avg_loss_pct,
            edge: stats.edge,
            total_trades: trades.len(),
            profit_factor: profit_factor(trades.iter()),
            exit_reason_counts: count_reasons(trades.iter()),
            trades,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn winning_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_winner())
    }

    pub fn losing_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| !t.is_winner())
    }

    fn grouped<K: Ord>(&self, key: impl Fn(&Trade) -> K) -> BTreeMap<K, PeriodStats> {
        let mut groups: BTreeMap<K, Vec<&Trade>> = BTreeMap::new();
        for t in &self.trades {
            groups.entry(key(t)).or_default().push(t);
        }
        groups
            .into_iter()
            .map(|(k, ts)| (k, PeriodStats::from_trades(&ts)))
            .collect()
    }

    /// Stats per entry year.
    pub fn by_year(&self) -> BTreeMap<i32, PeriodStats> {
        self.grouped(|t| t.entry_date().year())
    }

    /// Stats per entry quarter, keyed `"2024-Q1"`.
    pub fn by_quarter(&self) -> BTreeMap<String, PeriodStats> {
        self.grouped(|t| {
            let d = t.entry_date();
            format!("{}-Q{}", d.year(), (d.month() - 1) / 3 + 1)
        })
    }

    /// Stats per entry month, keyed `"2024-03"`.
    pub fn by_month(&self) -> BTreeMap<String, PeriodStats> {
        self.grouped(|t| {
            let d = t.entry_date();
            format!("{}-{:02}", d.year(), d.month())
        })
    }

    /// Alias of [`Self::by_year`], the input of the edge consistency score.
    pub fn yearly_stats(&self) -> BTreeMap<i32, PeriodStats> {
        self.by_year()
    }

    /// Per-symbol breakdown, best edge first.
    pub fn stock_performance(&self) -> Vec<StockPerformance> {
        let mut by_symbol: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
        for t in &self.trades {
            by_symbol.entry(t.symbol.as_str()).or_default().push(t);
        }
        let mut out: Vec<StockPerformance> = by_symbol
            .into_iter()
            .map(|(symbol, ts)| {
                let stats = EdgeStats::from_trades(ts.iter().copied());
                StockPerformance {
                    symbol: symbol.to_string(),
                    trades: ts.len(),
                    win_rate: stats.win_rate * 100.0,
                    avg_profit_pct: mean(ts.iter().map(|t| t.profit_pct())),
                    edge: stats.edge,
                    profit_factor: profit_factor(ts.iter().copied()),
                    total_profit_pct: ts.iter().map(|t| t.profit_pct()).sum(),
                    avg_holding_days: mean(ts.iter().map(|t| t.trading_days() as f64)),
                    max_drawdown_pct: max_drawdown_pct(ts.iter().copied()),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.edge
                .partial_cmp(&a.edge)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        out
    }

    /// Per-sector breakdown, best edge first.
    pub fn sector_stats(&self) -> Vec<SectorStats> {
        let mut by_sector: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
        for t in &self.trades {
            let key = t.sector.as_deref().unwrap_or(SectorStats::UNKNOWN);
            by_sector.entry(key).or_default().push(t);
        }
        let mut out: Vec<SectorStats> = by_sector
            .into_iter()
            .map(|(sector, ts)| SectorStats::from_trades(sector.to_string(), &ts))
            .collect();
        out.sort_by(|a, b| {
            b.edge
                .partial_cmp(&a.edge)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.sector.cmp(&b.sector))
        });
        out
    }

    /// `None` when there are no trades.
    pub fn excursion_summary(&self) -> Option<ExcursionSummary> {
        ExcursionSummary::from_trades(&self.trades)
    }
}

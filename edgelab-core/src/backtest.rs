//! Single-stock backtest loop: entry scan, forward exit scan, trade materialization.
//!
//! Fill rules:
//! - Entries fill on the signal bar's close, or `entry_delay_days` bars later;
//!   a delay running past the data drops the signal.
//! - The exit strategy is tested from the first bar after the entry. When it
//!   fires on bar `k` the trade fills on bar `k + 1`; a signal on the final
//!   bar has no fill bar and the entry is dropped.
//! - When the exit strategy never fires, the trade falls back to the first
//!   bar after the entry with reason [`NO_EXIT_SIGNAL`].
//! - A stock holds at most one trade at a time: entries at or before the
//!   previous trade's exit bar are skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BreadthContext, Stock, Trade};
use crate::strategy::{EntryStrategy, ExitStrategy};

pub const NO_EXIT_SIGNAL: &str = "No exit signal";

/// Inclusive date window for entries. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    #[serde(default)]
    pub after: Option<NaiveDate>,
    #[serde(default)]
    pub before: Option<NaiveDate>,
}

impl BacktestWindow {
    pub fn new(after: Option<NaiveDate>, before: Option<NaiveDate>) -> Self {
        Self { after, before }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Index range of `stock`'s quotes inside the window.
    pub fn index_range(&self, stock: &Stock) -> std::ops::Range<usize> {
        let start = self.after.map_or(0, |d| stock.index_on_or_after(d));
        let end = self.before.map_or(stock.len(), |d| stock.index_after(d));
        start..end.max(start)
    }
}

/// Per-stock run settings: which signals count and when they fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestOptions {
    #[serde(default)]
    pub window: BacktestWindow,
    /// Bars between the entry signal and the entry fill.
    #[serde(default)]
    pub entry_delay_days: usize,
}

impl BacktestOptions {
    pub fn new(window: BacktestWindow, entry_delay_days: usize) -> Self {
        Self {
            window,
            entry_delay_days,
        }
    }
}

impl From<BacktestWindow> for BacktestOptions {
    fn from(window: BacktestWindow) -> Self {
        Self::new(window, 0)
    }
}

/// Indices of quotes inside `window` where `entry` fires.
pub fn entry_candidates(
    stock: &Stock,
    entry: &EntryStrategy,
    window: &BacktestWindow,
    breadth: Option<&BreadthContext>,
) -> Vec<usize> {
    let quotes = stock.quotes();
    window
        .index_range(stock)
        .filter(|&i| entry.test(stock, &quotes[i], breadth))
        .collect()
}

/// Fill index and reason for an entry at `entry_idx`, or `None` when no fill bar exists.
fn find_exit(
    stock: &Stock,
    entry_idx: usize,
    exit: &ExitStrategy,
    breadth: Option<&BreadthContext>,
) -> Option<(usize, String)> {
    let quotes = stock.quotes();
    let entry = &quotes[entry_idx];
    let first = stock.index_after(entry.date);

    for k in first..quotes.len() {
        if let Some(reason) = exit.check(stock, entry, &quotes[k], breadth) {
            return (k + 1 < quotes.len()).then_some((k + 1, reason));
        }
    }
    (first < quotes.len()).then(|| (first, NO_EXIT_SIGNAL.to_string()))
}

/// Backtest one stock. Trades come back in entry order and never overlap.
pub fn backtest_stock(
    stock: &Stock,
    entry: &EntryStrategy,
    exit: &ExitStrategy,
    options: &BacktestOptions,
    breadth: Option<&BreadthContext>,
) -> Vec<Trade> {
    let quotes = stock.quotes();
    let candidates = entry_candidates(stock, entry, &options.window, breadth);
    let mut trades = Vec::new();
    let mut last_exit: Option<usize> = None;

    for signal_idx in candidates.iter().copied() {
        let entry_idx = signal_idx + options.entry_delay_days;
        if entry_idx >= quotes.len() || last_exit.is_some_and(|x| entry_idx <= x) {
            continue;
        }
        let Some((exit_idx, reason)) = find_exit(stock, entry_idx, exit, breadth) else {
            continue;
        };
        let span = quotes[entry_idx..=exit_idx].to_vec();
        if let Some(trade) = Trade::from_span(
            stock.symbol(),
            stock.sector_symbol().map(str::to_string),
            span,
            reason,
        ) {
            last_exit = Some(exit_idx);
            trades.push(trade);
        }
    }

    debug!(
        symbol = stock.symbol(),
        quotes = quotes.len(),
        entries = candidates.len(),
        trades = trades.len(),
        "backtested stock"
    );
    trades
}

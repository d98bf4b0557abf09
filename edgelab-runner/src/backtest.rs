//! Multi-stock backtest: build strategies once, fan out per stock, merge trades.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use edgelab_core::backtest::backtest_stock;
use edgelab_core::domain::{BreadthContext, Stock};
use edgelab_core::report::BacktestReport;

use crate::config::{BacktestRequest, ConfigError};
use crate::parallel::fan_out;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("backtest cancelled after {completed} of {total} stocks")]
    Cancelled { completed: usize, total: usize },
}

/// Backtest every stock independently and merge the trades into one report.
///
/// Stocks are independent units of work; `request.threads` picks the pool.
/// A raised `cancel` flag stops scheduling further stocks and the run
/// returns [`BacktestError::Cancelled`].
pub fn run_backtest(
    stocks: &[Stock],
    request: &BacktestRequest,
    breadth: Option<&BreadthContext>,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestReport, BacktestError> {
    let (entry, exit) = request.build_strategies()?;
    let options = request.options();
    let start = Instant::now();

    info!(
        stocks = stocks.len(),
        entry = entry.name(),
        exit = exit.name(),
        entry_delay_days = options.entry_delay_days,
        threads = request.threads,
        "backtest started"
    );

    let per_stock = fan_out(stocks, request.threads, cancel, |stock| {
        backtest_stock(stock, &entry, &exit, &options, breadth)
    })?;

    let completed = per_stock.iter().filter(|r| r.is_some()).count();
    if completed < stocks.len() {
        warn!(completed, total = stocks.len(), "backtest cancelled");
        return Err(BacktestError::Cancelled {
            completed,
            total: stocks.len(),
        });
    }

    let report = BacktestReport::new(per_stock.into_iter().flatten().flatten().collect());
    info!(
        trades = report.total_trades,
        win_rate = report.win_rate,
        edge = report.edge,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "backtest finished"
    );
    Ok(report)
}

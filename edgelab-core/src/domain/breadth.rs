//! Ambient market context supplied by the caller: breadth readings and the SPY series.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// One day of breadth data: the share of constituents in an uptrend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreadthPoint {
    /// Percentage (0–100) of constituents in an uptrend.
    pub breadth_percent: f64,
    /// 10-period EMA of `breadth_percent`.
    pub ema10: f64,
}

impl BreadthPoint {
    pub fn new(breadth_percent: f64, ema10: f64) -> Self {
        Self {
            breadth_percent,
            ema10,
        }
    }

    /// Breadth is trending up when it sits above its own 10 EMA.
    pub fn is_in_uptrend(&self) -> bool {
        self.breadth_percent > self.ema10
    }
}

/// Date-keyed breadth for the market and each sector, plus SPY quotes.
///
/// Built once before a run and shared read-only across all backtests.
#[derive(Debug, Clone, Default)]
pub struct BreadthContext {
    market: BTreeMap<NaiveDate, BreadthPoint>,
    sectors: HashMap<String, BTreeMap<NaiveDate, BreadthPoint>>,
    spy: BTreeMap<NaiveDate, Quote>,
}

impl BreadthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_market(&mut self, date: NaiveDate, point: BreadthPoint) {
        self.market.insert(date, point);
    }

    pub fn insert_sector(&mut self, sector: impl Into<String>, date: NaiveDate, point: BreadthPoint) {
        self.sectors
            .entry(sector.into())
            .or_default()
            .insert(date, point);
    }

    pub fn insert_spy(&mut self, quote: Quote) {
        self.spy.insert(quote.date, quote);
    }

    pub fn market(&self, date: NaiveDate) -> Option<&BreadthPoint> {
        self.market.get(&date)
    }

    pub fn sector(&self, sector: &str, date: NaiveDate) -> Option<&BreadthPoint> {
        self.sectors.get(sector).and_then(|s| s.get(&date))
    }

    pub fn spy(&self, date: NaiveDate) -> Option<&Quote> {
        self.spy.get(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.market.is_empty() && self.sectors.is_empty() && self.spy.is_empty()
    }
}

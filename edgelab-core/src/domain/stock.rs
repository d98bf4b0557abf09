//! Stock: a date-sorted quote series with O(log n) date lookups.
//!
//! Every lookup is a binary search over `quotes`, so the ascending-date order is
//! checked once at construction and cannot be broken afterwards: the quote
//! vector is private and only exposed as a slice.

use chrono::NaiveDate;
use thiserror::Error;

use super::events::{Earning, OrderBlock, OrderBlockKind};
use super::quote::{Quote, RawQuote};
use crate::enrich::enrich;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("{symbol}: quote {index} dated {date} precedes {previous}; quotes must be sorted by date ascending")]
    Unsorted {
        symbol: String,
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

#[derive(Debug, Clone)]
pub struct Stock {
    symbol: String,
    sector_symbol: Option<String>,
    quotes: Vec<Quote>,
    order_blocks: Vec<OrderBlock>,
    earnings: Vec<Earning>,
}

fn first_unsorted<T>(items: &[T], date: impl Fn(&T) -> NaiveDate) -> Option<usize> {
    items
        .windows(2)
        .position(|w| date(&w[0]) > date(&w[1]))
        .map(|i| i + 1)
}

impl Stock {
    /// Build a stock from already-enriched quotes.
    ///
    /// Fails on the first pair of quotes that is out of date order. Equal dates are allowed.
    pub fn new(symbol: impl Into<String>, quotes: Vec<Quote>) -> Result<Self, StockError> {
        let symbol = symbol.into();
        if let Some(index) = first_unsorted(&quotes, |q| q.date) {
            return Err(StockError::Unsorted {
                symbol,
                index,
                date: quotes[index].date,
                previous: quotes[index - 1].date,
            });
        }
        Ok(Self {
            symbol,
            sector_symbol: None,
            quotes,
            order_blocks: Vec::new(),
            earnings: Vec::new(),
        })
    }

    /// Validate ordering, run the enrichment pipeline, and build the stock.
    pub fn from_raw(symbol: impl Into<String>, raw: &[RawQuote]) -> Result<Self, StockError> {
        let symbol = symbol.into();
        if let Some(index) = first_unsorted(raw, |q| q.date) {
            return Err(StockError::Unsorted {
                symbol,
                index,
                date: raw[index].date,
                previous: raw[index - 1].date,
            });
        }
        Self::new(symbol, enrich(raw))
    }

    pub fn with_sector(mut self, sector_symbol: impl Into<String>) -> Self {
        self.sector_symbol = Some(sector_symbol.into());
        self
    }

    pub fn with_order_blocks(mut self, order_blocks: Vec<OrderBlock>) -> Self {
        self.order_blocks = order_blocks;
        self
    }

    pub fn with_earnings(mut self, earnings: Vec<Earning>) -> Self {
        self.earnings = earnings;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn sector_symbol(&self) -> Option<&str> {
        self.sector_symbol.as_deref()
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn order_blocks(&self) -> &[OrderBlock] {
        &self.order_blocks
    }

    pub fn earnings(&self) -> &[Earning] {
        &self.earnings
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    // ── Index lookups ──

    /// First index whose date is strictly after `date` (upper bound).
    ///
    /// Equals the number of quotes dated on or before `date`.
    pub fn index_after(&self, date: NaiveDate) -> usize {
        self.quotes.partition_point(|q| q.date <= date)
    }

    /// First index whose date is on or after `date` (lower bound).
    ///
    /// Equals the number of quotes dated before `date`.
    pub fn index_on_or_after(&self, date: NaiveDate) -> usize {
        self.quotes.partition_point(|q| q.date < date)
    }

    /// Index of the first quote sharing `quote`'s date.
    pub fn position_of(&self, quote: &Quote) -> Option<usize> {
        let idx = self.index_on_or_after(quote.date);
        (idx < self.quotes.len() && self.quotes[idx].date == quote.date).then_some(idx)
    }

    // ── Quote lookups ──

    pub fn quote_by_date(&self, date: NaiveDate) -> Option<&Quote> {
        self.quotes
            .get(self.index_on_or_after(date))
            .filter(|q| q.date == date)
    }

    pub fn next_quote(&self, quote: &Quote) -> Option<&Quote> {
        self.quotes.get(self.index_after(quote.date))
    }

    pub fn previous_quote(&self, quote: &Quote) -> Option<&Quote> {
        self.index_on_or_after(quote.date)
            .checked_sub(1)
            .map(|i| &self.quotes[i])
    }

    /// Up to `count` quotes immediately before `quote`, oldest first.
    pub fn history_before(&self, quote: &Quote, count: usize) -> &[Quote] {
        let end = self.index_on_or_after(quote.date);
        &self.quotes[end.saturating_sub(count)..end]
    }

    /// Quotes dated within `[start, end]`, inclusive on both sides.
    pub fn quotes_between(&self, start: NaiveDate, end: NaiveDate) -> &[Quote] {
        let from = self.index_on_or_after(start);
        let to = self.index_after(end).max(from);
        &self.quotes[from..to]
    }

    /// Number of quotes dated in `(start, end]`; zero when `end <= start`.
    pub fn count_trading_days_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.index_after(end).saturating_sub(self.index_after(start))
    }

    // ── Order blocks ──

    /// Blocks that have not been mitigated yet.
    pub fn active_order_blocks(&self) -> impl Iterator<Item = &OrderBlock> {
        self.order_blocks.iter().filter(|ob| ob.end_date.is_none())
    }

    pub fn bullish_order_blocks(&self, date: Option<NaiveDate>) -> Vec<&OrderBlock> {
        self.order_blocks_of(OrderBlockKind::Bullish, date)
    }

    pub fn bearish_order_blocks(&self, date: Option<NaiveDate>) -> Vec<&OrderBlock> {
        self.order_blocks_of(OrderBlockKind::Bearish, date)
    }

    fn order_blocks_of(&self, kind: OrderBlockKind, date: Option<NaiveDate>) -> Vec<&OrderBlock> {
        self.order_blocks
            .iter()
            .filter(|ob| ob.kind == kind)
            .filter(|ob| date.map_or(true, |d| ob.is_active_on(d)))
            .collect()
    }

    /// Whether `quote`'s candle overlaps a bearish block active on its date that is
    /// at least `min_age` trading days old.
    pub fn within_order_block(&self, quote: &Quote, min_age: usize, use_high: bool) -> bool {
        let top = quote.candle_top(use_high);
        let bottom = quote.candle_bottom();
        self.bearish_order_blocks(Some(quote.date))
            .into_iter()
            .filter(|ob| self.count_trading_days_between(ob.start_date, quote.date) >= min_age)
            .any(|ob| ob.overlaps(bottom, top))
    }

    // ── Earnings ──

    /// Earliest report strictly after `date`.
    pub fn next_earnings_after(&self, date: NaiveDate) -> Option<&Earning> {
        self.earnings
            .iter()
            .filter(|e| e.reported_date.is_some_and(|r| r > date))
            .min_by_key(|e| e.reported_date)
    }

    pub fn has_earnings_within_days(&self, date: NaiveDate, days: i64) -> bool {
        self.earnings.iter().any(|e| e.is_within_days_of(date, days))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn gapped() -> Stock {
        // Dates 0, 2, 4, 6 (gaps between quotes)
        let quotes = [0, 2, 4, 6]
            .iter()
            .map(|&o| quote_at(o, 100.0 + o as f64))
            .collect();
        Stock::new("GAP", quotes).unwrap()
    }

    // ── Construction ──

    #[test]
    fn unsorted_quotes_are_rejected() {
        let quotes = vec![quote_at(0, 1.0), quote_at(2, 1.0), quote_at(1, 1.0)];
        let err = Stock::new("BAD", quotes).unwrap_err();
        assert_eq!(
            err,
            StockError::Unsorted {
                symbol: "BAD".into(),
                index: 2,
                date: day(1),
                previous: day(2),
            }
        );
    }

    #[test]
    fn empty_and_single_quote_are_accepted() {
        assert!(Stock::new("E", vec![]).unwrap().is_empty());
        assert_eq!(Stock::new("S", vec![quote_at(0, 1.0)]).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_dates_are_accepted() {
        assert!(Stock::new("D", vec![quote_at(0, 1.0), quote_at(0, 2.0)]).is_ok());
    }

    #[test]
    fn from_raw_rejects_unsorted_before_enriching() {
        let raw = vec![
            RawQuote {
                symbol: "X".into(),
                date: day(1),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1,
            },
            RawQuote {
                symbol: "X".into(),
                date: day(0),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1,
            },
        ];
        assert!(matches!(
            Stock::from_raw("X", &raw),
            Err(StockError::Unsorted { index: 1, .. })
        ));
    }

    // ── Binary search ──

    #[test]
    fn index_bounds_on_gapped_series() {
        let s = gapped();
        assert_eq!(s.index_after(day(-1)), 0);
        assert_eq!(s.index_after(day(0)), 1);
        assert_eq!(s.index_after(day(1)), 1);
        assert_eq!(s.index_after(day(6)), 4);
        assert_eq!(s.index_on_or_after(day(0)), 0);
        assert_eq!(s.index_on_or_after(day(1)), 1);
        assert_eq!(s.index_on_or_after(day(2)), 1);
        assert_eq!(s.index_on_or_after(day(7)), 4);
    }

    #[test]
    fn quote_by_date_requires_exact_match() {
        let s = gapped();
        assert_eq!(s.quote_by_date(day(4)).map(|q| q.close), Some(104.0));
        assert!(s.quote_by_date(day(3)).is_none());
        assert!(s.quote_by_date(day(10)).is_none());
    }

    #[test]
    fn next_and_previous_quotes() {
        let s = gapped();
        let q = &s.quotes()[1];
        assert_eq!(s.next_quote(q).map(|q| q.date), Some(day(4)));
        assert_eq!(s.previous_quote(q).map(|q| q.date), Some(day(0)));
        assert!(s.previous_quote(&s.quotes()[0]).is_none());
        assert!(s.next_quote(&s.quotes()[3]).is_none());
    }

    #[test]
    fn count_trading_days_uses_bars_not_calendar() {
        let s = gapped();
        // quotes in (0, 6] are dated 2, 4, 6
        assert_eq!(s.count_trading_days_between(day(0), day(6)), 3);
        assert_eq!(s.count_trading_days_between(day(1), day(4)), 2);
        assert_eq!(s.count_trading_days_between(day(6), day(0)), 0);
    }

    #[test]
    fn history_and_ranges() {
        let s = stock_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let q = &s.quotes()[3];
        let hist: Vec<f64> = s.history_before(q, 2).iter().map(|q| q.close).collect();
        assert_eq!(hist, vec![2.0, 3.0]);
        assert_eq!(s.history_before(&s.quotes()[0], 5).len(), 0);
        assert_eq!(s.quotes_between(day(1), day(3)).len(), 3);
        assert!(s.quotes_between(day(3), day(1)).is_empty());
    }

    // ── Events ──

    #[test]
    fn order_block_age_is_measured_in_trading_days() {
        let s = stock_from_closes(&[90.0; 10]).with_order_blocks(vec![OrderBlock {
            low: 85.0,
            high: 95.0,
            start_date: day(2),
            end_date: None,
            kind: OrderBlockKind::Bearish,
        }]);
        let q = &s.quotes()[6];
        assert!(s.within_order_block(q, 4, false));
        assert!(!s.within_order_block(q, 5, false));
        assert_eq!(s.bearish_order_blocks(Some(day(6))).len(), 1);
        assert!(s.bullish_order_blocks(None).is_empty());
        assert_eq!(s.active_order_blocks().count(), 1);
    }

    #[test]
    fn next_earnings_skips_past_and_unknown_reports() {
        let s = stock_from_closes(&[1.0]).with_earnings(vec![
            Earning {
                fiscal_date_ending: day(-60),
                reported_date: Some(day(-30)),
            },
            Earning {
                fiscal_date_ending: day(30),
                reported_date: None,
            },
            Earning {
                fiscal_date_ending: day(0),
                reported_date: Some(day(20)),
            },
        ]);
        assert_eq!(
            s.next_earnings_after(day(0)).and_then(|e| e.reported_date),
            Some(day(20))
        );
        assert!(s.has_earnings_within_days(day(15), 5));
        assert!(!s.has_earnings_within_days(day(10), 5));
    }
}

//! Atomic predicate bodies.
//!
//! Missing data (warm-up indicators, absent breadth context, no entry quote)
//! makes a predicate fail rather than guess.

use super::{Check, Condition, EvalContext};
use crate::domain::Quote;

/// EMA for `period` once it has warmed up.
fn ema(quote: &Quote, period: usize) -> Option<f64> {
    quote.ema.get(period).filter(|v| *v > 0.0)
}

impl Condition {
    pub(crate) fn check(&self, ctx: &EvalContext<'_>) -> Check {
        let q = ctx.quote;
        match *self {
            Self::Always => Check::flag(true),
            Self::Never => Check::flag(false),
            Self::Composite(ref c) => Check::flag(c.evaluate(ctx)),

            // ── Price and trend ──
            Self::Uptrend => {
                let passed = q.ema.ema10 > 0.0
                    && q.ema.ema50 > 0.0
                    && q.ema.ema10 > q.ema.ema20
                    && q.close > q.ema.ema50;
                Check::compare(passed, q.close, q.ema.ema50)
            }
            Self::PriceAboveEma { period } => match ema(q, period) {
                Some(e) => Check::compare(q.close > e, q.close, e),
                None => Check::flag(false),
            },
            Self::EmaAlignment { fast, slow } => match (ema(q, fast), ema(q, slow)) {
                (Some(f), Some(s)) => Check::compare(f > s, f, s),
                _ => Check::flag(false),
            },
            Self::EmaBullishCross { fast, slow } => {
                let prev = ctx.stock.previous_quote(q);
                match (ema(q, fast), ema(q, slow), prev) {
                    (Some(f), Some(s), Some(p)) => {
                        let was_below = match (ema(p, fast), ema(p, slow)) {
                            (Some(pf), Some(ps)) => pf <= ps,
                            _ => false,
                        };
                        Check::compare(was_below && f > s, f, s)
                    }
                    _ => Check::flag(false),
                }
            }
            Self::AdxRange { min, max } => match q.adx {
                Some(adx) => Check::compare(adx >= min && adx <= max, adx, min),
                None => Check::flag(false),
            },
            Self::MinimumPrice { price } => Check::compare(q.close >= price, q.close, price),
            Self::VolumeAboveAverage {
                multiplier,
                lookback_days,
            } => {
                let history = ctx.stock.history_before(q, lookback_days);
                if history.is_empty() || history.len() < lookback_days / 2 {
                    return Check::flag(false);
                }
                let avg = history.iter().map(|h| h.volume as f64).sum::<f64>() / history.len() as f64;
                let required = avg * multiplier;
                let volume = q.volume as f64;
                Check::compare(volume >= required, volume, required)
            }
            Self::PriceNearDonchianHigh { max_distance_pct } => {
                if q.donchian_upper <= 0.0 || q.close <= 0.0 {
                    return Check::flag(false);
                }
                let distance = (q.donchian_upper - q.close) / q.close * 100.0;
                Check::compare(distance <= max_distance_pct, distance, max_distance_pct)
            }

            // ── Breadth context ──
            Self::MarketUptrend => match ctx.breadth.and_then(|b| b.market(q.date)) {
                Some(p) => Check::compare(p.is_in_uptrend(), p.breadth_percent, p.ema10),
                None => Check::flag(false),
            },
            Self::SectorUptrend => {
                let point = ctx
                    .stock
                    .sector_symbol()
                    .and_then(|s| ctx.breadth.and_then(|b| b.sector(s, q.date)));
                match point {
                    Some(p) => Check::compare(p.is_in_uptrend(), p.breadth_percent, p.ema10),
                    None => Check::flag(false),
                }
            }
            Self::SpyUptrend => {
                let spy = ctx.breadth.and_then(|b| b.spy(q.date));
                Check::flag(spy.is_some_and(Quote::is_uptrend))
            }
            Self::MarketBreadthAbove { threshold } => {
                let actual = ctx
                    .breadth
                    .and_then(|b| b.market(q.date))
                    .map_or(0.0, |p| p.breadth_percent);
                Check::compare(actual >= threshold, actual, threshold)
            }
            Self::SectorBreadthAbove { threshold } => {
                let actual = ctx
                    .stock
                    .sector_symbol()
                    .and_then(|s| ctx.breadth.and_then(|b| b.sector(s, q.date)))
                    .map_or(0.0, |p| p.breadth_percent);
                Check::compare(actual >= threshold, actual, threshold)
            }
            Self::MarketAndSectorDowntrend => {
                let Some(breadth) = ctx.breadth else {
                    return Check::flag(false);
                };
                let market_up = breadth.market(q.date).is_some_and(|p| p.is_in_uptrend());
                let sector_up = ctx
                    .stock
                    .sector_symbol()
                    .and_then(|s| breadth.sector(s, q.date))
                    .is_some_and(|p| p.is_in_uptrend());
                Check::flag(!market_up && !sector_up)
            }

            // ── Earnings and order blocks ──
            Self::NoEarningsWithinDays { days } => {
                Check::flag(!ctx.stock.has_earnings_within_days(q.date, days))
            }
            Self::BeforeEarnings { days } => {
                Check::flag(ctx.stock.has_earnings_within_days(q.date, days))
            }
            Self::BelowOrderBlock {
                percent_below,
                age_days,
            } => {
                let stock = ctx.stock;
                let mut relevant = stock
                    .bearish_order_blocks(Some(q.date))
                    .into_iter()
                    .filter(|ob| stock.count_trading_days_between(ob.start_date, q.date) >= age_days)
                    .filter(|ob| q.close <= ob.high)
                    .peekable();
                if relevant.peek().is_none() {
                    return Check::flag(true);
                }
                let factor = 1.0 - percent_below / 100.0;
                let ceiling = relevant.map(|ob| ob.low * factor).fold(f64::INFINITY, f64::min);
                Check::compare(q.close <= ceiling, q.close, ceiling)
            }
            Self::NotInOrderBlock { age_days } => {
                Check::flag(!ctx.stock.within_order_block(q, age_days, false))
            }
            Self::BearishOrderBlock { age_days } => {
                Check::flag(ctx.stock.within_order_block(q, age_days, true))
            }

            // ── Open-trade exits ──
            Self::StopLoss { atr_multiplier } => match ctx.entry {
                Some(entry) => {
                    let stop = entry.close - atr_multiplier * entry.atr;
                    Check::compare(q.close < stop, q.close, stop)
                }
                None => Check::flag(false),
            },
            Self::ProfitTarget {
                atr_multiplier,
                ema_period,
            } => match (ctx.entry, ema(q, ema_period)) {
                (Some(_), Some(e)) => {
                    let target = e + atr_multiplier * q.atr;
                    Check::compare(q.close > target, q.close, target)
                }
                _ => Check::flag(false),
            },
            Self::AtrTrailingStop { atr_multiplier } => match ctx.entry {
                Some(entry) => {
                    let highest = ctx
                        .stock
                        .quotes_between(entry.date, q.date)
                        .iter()
                        .map(|h| h.close)
                        .fold(entry.close, f64::max);
                    let stop = highest - atr_multiplier * q.atr;
                    Check::compare(q.close < stop, q.close, stop)
                }
                None => Check::flag(false),
            },
            Self::PriceBelowEma { period } => match ema(q, period) {
                Some(e) => Check::compare(q.close < e, q.close, e),
                None => Check::flag(false),
            },
            Self::EmaCross { fast, slow } => match (ema(q, fast), ema(q, slow)) {
                (Some(f), Some(s)) => Check::compare(f < s, f, s),
                _ => Check::flag(false),
            },
            Self::BarsHeld { bars } => match ctx.entry {
                Some(entry) => {
                    let held = ctx.stock.count_trading_days_between(entry.date, q.date);
                    Check::compare(held >= bars, held as f64, bars as f64)
                }
                None => Check::flag(false),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::test_support::{day, quote_at, stock_from_closes};
    use crate::domain::{
        BreadthContext, BreadthPoint, EmaSet, Earning, OrderBlock, OrderBlockKind, Stock, Trend,
    };

    fn with_ema(offset: i64, close: f64, ema: EmaSet) -> Quote {
        Quote {
            ema,
            ..quote_at(offset, close)
        }
    }

    fn emas(ema10: f64, ema20: f64, ema50: f64) -> EmaSet {
        EmaSet {
            ema5: ema10,
            ema10,
            ema20,
            ema50,
            ema100: ema50,
            ema200: ema50,
        }
    }

    fn eval(cond: &Condition, stock: &Stock, idx: usize) -> bool {
        cond.evaluate(&EvalContext::new(stock, &stock.quotes()[idx]))
    }

    // ── Price and trend ──

    #[test]
    fn uptrend_needs_both_legs() {
        let stock = Stock::new(
            "T",
            vec![
                with_ema(0, 110.0, emas(105.0, 100.0, 100.0)),
                with_ema(1, 95.0, emas(105.0, 100.0, 100.0)),
                with_ema(2, 110.0, emas(99.0, 100.0, 100.0)),
            ],
        )
        .unwrap();
        assert!(eval(&Condition::Uptrend, &stock, 0));
        assert!(!eval(&Condition::Uptrend, &stock, 1));
        assert!(!eval(&Condition::Uptrend, &stock, 2));
    }

    #[test]
    fn warm_up_ema_never_passes() {
        let stock = stock_from_closes(&[100.0]);
        assert!(!eval(&Condition::PriceAboveEma { period: 20 }, &stock, 0));
        assert!(!eval(&Condition::PriceBelowEma { period: 20 }, &stock, 0));
        assert!(!eval(&Condition::EmaCross { fast: 10, slow: 20 }, &stock, 0));
    }

    #[test]
    fn bullish_cross_only_on_the_crossing_bar() {
        let stock = Stock::new(
            "T",
            vec![
                with_ema(0, 100.0, emas(99.0, 100.0, 90.0)),
                with_ema(1, 100.0, emas(101.0, 100.0, 90.0)),
                with_ema(2, 100.0, emas(102.0, 100.0, 90.0)),
            ],
        )
        .unwrap();
        let cross = Condition::EmaBullishCross { fast: 10, slow: 20 };
        assert!(!eval(&cross, &stock, 0));
        assert!(eval(&cross, &stock, 1));
        assert!(!eval(&cross, &stock, 2));
    }

    #[test]
    fn adx_range_is_inclusive_and_needs_value() {
        let stock = Stock::new(
            "T",
            vec![
                Quote { adx: Some(20.0), ..quote_at(0, 1.0) },
                Quote { adx: Some(50.5), ..quote_at(1, 1.0) },
                quote_at(2, 1.0),
            ],
        )
        .unwrap();
        let c = Condition::AdxRange { min: 20.0, max: 50.0 };
        assert!(eval(&c, &stock, 0));
        assert!(!eval(&c, &stock, 1));
        assert!(!eval(&c, &stock, 2));
    }

    #[test]
    fn volume_above_average_uses_prior_bars_only() {
        let mut quotes: Vec<Quote> = (0..5).map(|i| quote_at(i, 10.0)).collect();
        quotes[4].volume = 1_500;
        let stock = Stock::new("T", quotes).unwrap();
        let c = Condition::VolumeAboveAverage {
            multiplier: 1.3,
            lookback_days: 4,
        };
        assert!(eval(&c, &stock, 4));
        assert!(!eval(&c, &stock, 3));
        // one prior bar is less than half of the 4-bar lookback
        assert!(!eval(&c, &stock, 1));
    }

    #[test]
    fn donchian_distance() {
        let stock = Stock::new(
            "T",
            vec![
                Quote { donchian_upper: 101.0, ..quote_at(0, 100.0) },
                Quote { donchian_upper: 103.0, ..quote_at(1, 100.0) },
                quote_at(2, 100.0),
            ],
        )
        .unwrap();
        let c = Condition::PriceNearDonchianHigh { max_distance_pct: 1.5 };
        assert!(eval(&c, &stock, 0));
        assert!(!eval(&c, &stock, 1));
        assert!(!eval(&c, &stock, 2));
    }

    // ── Breadth context ──

    #[test]
    fn breadth_conditions_fail_without_context() {
        let stock = stock_from_closes(&[10.0]).with_sector("XLK");
        for c in [
            Condition::MarketUptrend,
            Condition::SectorUptrend,
            Condition::SpyUptrend,
            Condition::MarketBreadthAbove { threshold: 0.0 + f64::EPSILON },
            Condition::MarketAndSectorDowntrend,
        ] {
            assert!(!eval(&c, &stock, 0), "{c:?}");
        }
    }

    #[test]
    fn breadth_conditions_read_the_context() {
        let stock = stock_from_closes(&[10.0]).with_sector("XLK");
        let mut breadth = BreadthContext::new();
        breadth.insert_market(day(0), BreadthPoint::new(62.0, 55.0));
        breadth.insert_sector("XLK", day(0), BreadthPoint::new(40.0, 45.0));
        breadth.insert_spy(Quote {
            trend: Trend::Uptrend,
            ..quote_at(0, 500.0)
        });
        let ctx = EvalContext::new(&stock, &stock.quotes()[0]).with_breadth(Some(&breadth));

        assert!(Condition::MarketUptrend.evaluate(&ctx));
        assert!(!Condition::SectorUptrend.evaluate(&ctx));
        assert!(Condition::SpyUptrend.evaluate(&ctx));
        assert!(Condition::MarketBreadthAbove { threshold: 60.0 }.evaluate(&ctx));
        assert!(!Condition::SectorBreadthAbove { threshold: 50.0 }.evaluate(&ctx));
        assert!(!Condition::MarketAndSectorDowntrend.evaluate(&ctx));
    }

    // ── Earnings and order blocks ──

    #[test]
    fn earnings_window() {
        let stock = stock_from_closes(&[10.0; 10]).with_earnings(vec![Earning {
            fiscal_date_ending: day(-10),
            reported_date: Some(day(7)),
        }]);
        let no_earnings = Condition::NoEarningsWithinDays { days: 3 };
        let before = Condition::BeforeEarnings { days: 3 };
        assert!(eval(&no_earnings, &stock, 3));
        assert!(!eval(&no_earnings, &stock, 4));
        assert!(eval(&before, &stock, 4));
        assert!(!eval(&before, &stock, 8));
    }

    #[test]
    fn below_order_block_requires_clearance() {
        let block = OrderBlock {
            low: 100.0,
            high: 110.0,
            start_date: day(0),
            end_date: None,
            kind: OrderBlockKind::Bearish,
        };
        let stock = stock_from_closes(&[99.0, 99.0, 97.0, 120.0]).with_order_blocks(vec![block]);
        let c = Condition::BelowOrderBlock {
            percent_below: 2.0,
            age_days: 1,
        };
        assert!(!eval(&c, &stock, 1), "99 is within 2% of the block low");
        assert!(eval(&c, &stock, 2), "97 clears 98");
        assert!(eval(&c, &stock, 3), "price above the block is not blocked");
        assert!(eval(&c, &stock, 0), "block not active on its start date");
    }

    #[test]
    fn order_block_overlap_conditions() {
        let block = OrderBlock {
            low: 95.0,
            high: 105.0,
            start_date: day(0),
            end_date: None,
            kind: OrderBlockKind::Bearish,
        };
        let stock = stock_from_closes(&[80.0, 80.0, 100.0]).with_order_blocks(vec![block]);
        assert!(eval(&Condition::NotInOrderBlock { age_days: 1 }, &stock, 1));
        assert!(!eval(&Condition::NotInOrderBlock { age_days: 1 }, &stock, 2));
        assert!(eval(&Condition::BearishOrderBlock { age_days: 2 }, &stock, 2));
        assert!(!eval(&Condition::BearishOrderBlock { age_days: 3 }, &stock, 2));
    }

    // ── Open-trade exits ──

    #[test]
    fn exits_need_an_entry() {
        let stock = stock_from_closes(&[10.0, 1.0]);
        for c in [
            Condition::StopLoss { atr_multiplier: 1.0 },
            Condition::AtrTrailingStop { atr_multiplier: 1.0 },
            Condition::BarsHeld { bars: 0 },
        ] {
            assert!(!eval(&c, &stock, 1), "{c:?}");
        }
    }

    #[test]
    fn stop_loss_below_entry_minus_atr() {
        let quotes = vec![
            Quote { atr: 2.0, ..quote_at(0, 100.0) },
            Quote { atr: 2.0, ..quote_at(1, 97.0) },
            Quote { atr: 2.0, ..quote_at(2, 95.0) },
        ];
        let stock = Stock::new("T", quotes).unwrap();
        let c = Condition::StopLoss { atr_multiplier: 2.0 };
        let entry = &stock.quotes()[0];
        let at = |i: usize| c.evaluate(&EvalContext::new(&stock, &stock.quotes()[i]).with_entry(entry));
        assert!(!at(1));
        assert!(at(2));
    }

    #[test]
    fn trailing_stop_follows_highest_close() {
        let quotes = vec![
            Quote { atr: 1.0, ..quote_at(0, 100.0) },
            Quote { atr: 1.0, ..quote_at(1, 110.0) },
            Quote { atr: 1.0, ..quote_at(2, 108.5) },
            Quote { atr: 1.0, ..quote_at(3, 107.0) },
        ];
        let stock = Stock::new("T", quotes).unwrap();
        let c = Condition::AtrTrailingStop { atr_multiplier: 2.0 };
        let entry = &stock.quotes()[0];
        let at = |i: usize| c.evaluate(&EvalContext::new(&stock, &stock.quotes()[i]).with_entry(entry));
        assert!(!at(2), "108.5 is above 110 - 2");
        assert!(at(3), "107 is below 108");
    }

    #[test]
    fn bars_held_counts_trading_days() {
        let stock = stock_from_closes(&[1.0, 1.0, 1.0, 1.0]);
        let c = Condition::BarsHeld { bars: 2 };
        let entry = &stock.quotes()[0];
        let at = |i: usize| c.evaluate(&EvalContext::new(&stock, &stock.quotes()[i]).with_entry(entry));
        assert!(!at(1));
        assert!(at(2));
        assert!(at(3));
    }
}

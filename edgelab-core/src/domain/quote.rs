//! Quote: one trading day for one symbol, raw and enriched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unenriched daily OHLCV record as supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl RawQuote {
    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// OHLC consistency: high bounds the candle from above, low from below, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Trend label attached to an enriched quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    /// Not enough history for the trend EMAs.
    #[default]
    Undetermined,
}

/// Close-price EMAs carried on every enriched quote.
///
/// A value of `0.0` means the EMA is still warming up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmaSet {
    pub ema5: f64,
    pub ema10: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub ema200: f64,
}

impl EmaSet {
    pub const PERIODS: [usize; 6] = [5, 10, 20, 50, 100, 200];

    /// EMA for one of the supported periods.
    pub fn get(&self, period: usize) -> Option<f64> {
        match period {
            5 => Some(self.ema5),
            10 => Some(self.ema10),
            20 => Some(self.ema20),
            50 => Some(self.ema50),
            100 => Some(self.ema100),
            200 => Some(self.ema200),
            _ => None,
        }
    }

    pub fn is_supported(period: usize) -> bool {
        Self::PERIODS.contains(&period)
    }
}

/// Enriched daily quote. Produced once by [`crate::enrich::enrich`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Wilder ATR(14); `0.0` during warm-up.
    pub atr: f64,
    /// Wilder ADX(14); `None` during warm-up.
    pub adx: Option<f64>,
    pub ema: EmaSet,
    /// Highest high of the last 20 bars including this one; `0.0` during warm-up.
    pub donchian_upper: f64,
    pub trend: Trend,
}

impl Quote {
    /// Quote with raw prices and empty indicator fields.
    pub fn from_raw(raw: &RawQuote) -> Self {
        Self {
            symbol: raw.symbol.clone(),
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            atr: 0.0,
            adx: None,
            ema: EmaSet::default(),
            donchian_upper: 0.0,
            trend: Trend::Undetermined,
        }
    }

    pub fn is_uptrend(&self) -> bool {
        self.trend == Trend::Uptrend
    }

    /// Upper edge of the candle body (or the wick when `use_high`).
    pub fn candle_top(&self, use_high: bool) -> f64 {
        if use_high {
            self.high
        } else {
            self.open.max(self.close)
        }
    }

    pub fn candle_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

//! Enrichment pipeline: raw quotes in, immutable enriched quotes out.
//!
//! Every indicator series is computed once over the whole history and zipped
//! back onto the quotes. Nothing downstream recomputes or mutates them.

use crate::domain::{EmaSet, Quote, RawQuote, Trend};
use crate::indicators::{Adx, Atr, DonchianUpper, Ema, Indicator};

pub const ATR_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const DONCHIAN_PERIOD: usize = 20;

/// Warm-up `NaN` becomes `0.0`.
fn or_zero(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Uptrend when EMA10 > EMA20 and the close sits above EMA50.
pub fn classify_trend(close: f64, ema: &EmaSet) -> Trend {
    if ema.ema10 == 0.0 || ema.ema20 == 0.0 || ema.ema50 == 0.0 {
        Trend::Undetermined
    } else if ema.ema10 > ema.ema20 && close > ema.ema50 {
        Trend::Uptrend
    } else {
        Trend::Downtrend
    }
}

/// Enrich a date-sorted raw series. Output has the same length and order.
pub fn enrich(raw: &[RawQuote]) -> Vec<Quote> {
    let emas: Vec<Vec<f64>> = EmaSet::PERIODS
        .iter()
        .map(|&p| Ema::new(p).compute(raw))
        .collect();
    let atr = Atr::new(ATR_PERIOD).compute(raw);
    let adx = Adx::new(ADX_PERIOD).compute(raw);
    let donchian = DonchianUpper::new(DONCHIAN_PERIOD).compute(raw);

    raw.iter()
        .enumerate()
        .map(|(i, r)| {
            let ema = EmaSet {
                ema5: or_zero(emas[0][i]),
                ema10: or_zero(emas[1][i]),
                ema20: or_zero(emas[2][i]),
                ema50: or_zero(emas[3][i]),
                ema100: or_zero(emas[4][i]),
                ema200: or_zero(emas[5][i]),
            };
            Quote {
                atr: or_zero(atr[i]),
                adx: (!adx[i].is_nan()).then_some(adx[i]),
                donchian_upper: or_zero(donchian[i]),
                trend: classify_trend(r.close, &ema),
                ema,
                ..Quote::from_raw(r)
            }
        })
        .collect()
}

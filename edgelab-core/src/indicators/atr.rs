//! Average true range with Wilder smoothing.
//!
//! TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|).
//! TR[0] has no previous close and is excluded, so the first ATR lands at index `period`.

use super::Indicator;
use crate::domain::RawQuote;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, quotes: &[RawQuote]) -> Vec<f64> {
        let mut tr = true_range(quotes);
        if let Some(first) = tr.first_mut() {
            *first = f64::NAN;
        }
        wilder_smooth(&tr, self.period)
    }
}

/// True range per quote; index 0 is plain `high - low`.
pub fn true_range(quotes: &[RawQuote]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    quotes
        .iter()
        .map(|q| {
            let range = q.high - q.low;
            let tr = match prev_close {
                Some(pc) => range.max((q.high - pc).abs()).max((q.low - pc).abs()),
                None => range,
            };
            prev_close = Some(q.close);
            tr
        })
        .collect()
}

/// Wilder smoothing (alpha = 1/period).
///
/// Seeds with the mean of the first run of `period` consecutive non-`NaN`
/// values; a `NaN` after the seed blanks the rest of the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }

    let Some(seed_start) = (0..=n - period)
        .find(|&s| values[s..s + period].iter().all(|v| !v.is_nan()))
    else {
        return out;
    };
    let seed_end = seed_start + period;
    let mut prev = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if values[i].is_nan() {
            break;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}

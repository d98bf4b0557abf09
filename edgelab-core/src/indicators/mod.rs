//! Indicator series used by the enrichment pipeline.
//!
//! Indicators are pure functions: raw quote history in, one `f64` per quote out.
//! Warm-up positions are `NaN`; the enrichment step maps them to the quote's
//! "not yet available" representation.
//!
//! No value at index t may depend on quotes after t.

pub mod adx;
pub mod atr;
pub mod donchian;
pub mod ema;

pub use adx::Adx;
pub use atr::Atr;
pub use donchian::DonchianUpper;
pub use ema::Ema;

use crate::domain::RawQuote;

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "ema_20").
    fn name(&self) -> &str;

    /// Number of leading `NaN` values in the output.
    fn lookback(&self) -> usize;

    /// Compute the series; output length equals `quotes.len()`.
    fn compute(&self, quotes: &[RawQuote]) -> Vec<f64>;
}

/// Synthetic raw quotes from `(open, high, low, close)` tuples, one per day.
#[cfg(test)]
pub fn make_raw(data: &[(f64, f64, f64, f64)]) -> Vec<RawQuote> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| RawQuote {
            symbol: "TEST".to_string(),
            date: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Synthetic raw quotes from closes: open = previous close, high/low = body ± 1.
#[cfg(test)]
pub fn make_raw_from_closes(closes: &[f64]) -> Vec<RawQuote> {
    let data: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_raw(&data)
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, epsilon={epsilon}"
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

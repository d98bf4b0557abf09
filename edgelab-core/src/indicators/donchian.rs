//! Donchian upper band: highest high over the trailing `period` quotes, current included.

use super::Indicator;
use crate::domain::RawQuote;

#[derive(Debug, Clone)]
pub struct DonchianUpper {
    period: usize,
    name: String,
}

impl DonchianUpper {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            name: format!("donchian_upper_{period}"),
        }
    }
}

impl Indicator for DonchianUpper {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, quotes: &[RawQuote]) -> Vec<f64> {
        let mut out = vec![f64::NAN; quotes.len()];
        if quotes.len() < self.period {
            return out;
        }
        for (i, window) in quotes.windows(self.period).enumerate() {
            if window.iter().any(|q| q.high.is_nan()) {
                continue;
            }
            out[i + self.period - 1] = window
                .iter()
                .map(|q| q.high)
                .fold(f64::NEG_INFINITY, f64::max);
        }
        out
    }
}

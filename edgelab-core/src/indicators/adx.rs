//! Average directional index (Wilder).
//!
//! +DM / -DM and TR are Wilder-smoothed over `period`, turned into
//! DX = 100 * |+DI - -DI| / (+DI + -DI), and DX is Wilder-smoothed again.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::RawQuote;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

/// Directional movement for one step: (+DM, -DM).
fn directional_movement(prev: &RawQuote, cur: &RawQuote) -> (f64, f64) {
    let up = cur.high - prev.high;
    let down = prev.low - cur.low;
    if up.is_nan() || down.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period
    }

    fn compute(&self, quotes: &[RawQuote]) -> Vec<f64> {
        let n = quotes.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            (plus_dm[i], minus_dm[i]) = directional_movement(&quotes[i - 1], &quotes[i]);
        }

        let tr = wilder_smooth(&true_range(quotes), self.period);
        let plus = wilder_smooth(&plus_dm, self.period);
        let minus = wilder_smooth(&minus_dm, self.period);

        let dx: Vec<f64> = (0..n)
            .map(|i| {
                if tr[i].is_nan() || plus[i].is_nan() || minus[i].is_nan() || tr[i] == 0.0 {
                    return f64::NAN;
                }
                let plus_di = 100.0 * plus[i] / tr[i];
                let minus_di = 100.0 * minus[i] / tr[i];
                let sum = plus_di + minus_di;
                if sum == 0.0 {
                    0.0
                } else {
                    100.0 * (plus_di - minus_di).abs() / sum
                }
            })
            .collect();

        wilder_smooth(&dx, self.period)
    }
}

//! Precomputed per-stock events: order blocks and earnings reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBlockKind {
    /// Demand zone below price.
    Bullish,
    /// Supply zone above price.
    Bearish,
}

/// A price zone derived from prior price action. `end_date` is `None` while unmitigated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub low: f64,
    pub high: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub kind: OrderBlockKind,
}

impl OrderBlock {
    pub fn starts_before(&self, date: NaiveDate) -> bool {
        self.start_date < date
    }

    /// True when the block is unmitigated or mitigated after `date`.
    pub fn ends_after(&self, date: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| end > date)
    }

    /// Started strictly before `date` and not yet mitigated on it.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.starts_before(date) && self.ends_after(date)
    }

    /// Whether the closed range `[bottom, top]` overlaps the zone.
    pub fn overlaps(&self, bottom: f64, top: f64) -> bool {
        top >= self.low && bottom <= self.high
    }
}

/// A quarterly earnings report. `reported_date` is `None` for scheduled-but-unknown dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earning {
    pub fiscal_date_ending: NaiveDate,
    pub reported_date: Option<NaiveDate>,
}

impl Earning {
    /// True when the report lands on `date` or within `days` calendar days after it.
    pub fn is_within_days_of(&self, date: NaiveDate, days: i64) -> bool {
        match self.reported_date {
            Some(reported) => (0..=days).contains(&(reported - date).num_days()),
            None => false,
        }
    }
}

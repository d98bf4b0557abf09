//! Trade: one simulated round trip from an entry quote to an exit quote.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// A completed long trade.
///
/// `quotes` spans the entry bar through the exit bar inclusive, so
/// `quotes[0] == entry` and `quotes.last() == exit`, and the exit is always
/// dated strictly after the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub symbol: String,
    pub sector: Option<String>,

    // ── Entry / exit ──
    pub entry: Quote,
    pub exit: Quote,
    pub exit_reason: String,

    /// Bars held, entry and exit included.
    pub quotes: Vec<Quote>,

    /// Exit close minus entry close, per share.
    pub profit: f64,
}

impl Trade {
    /// Build a trade from the quote span it covers.
    ///
    /// Returns `None` unless the span has at least two quotes, the last is
    /// dated after the first, and the entry close is a positive price.
    pub fn from_span(
        symbol: impl Into<String>,
        sector: Option<String>,
        quotes: Vec<Quote>,
        exit_reason: impl Into<String>,
    ) -> Option<Self> {
        let entry = quotes.first()?.clone();
        let exit = quotes.last()?.clone();
        if exit.date <= entry.date || entry.close.is_nan() || entry.close <= 0.0 {
            return None;
        }
        Some(Self {
            symbol: symbol.into(),
            sector,
            profit: exit.close - entry.close,
            entry,
            exit,
            exit_reason: exit_reason.into(),
            quotes,
        })
    }

    /// Profit as a percentage of the entry close.
    pub fn profit_pct(&self) -> f64 {
        self.profit / self.entry.close * 100.0
    }

    /// Winners strictly gain; a flat trade counts as a loss.
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry.date
    }

    pub fn exit_date(&self) -> NaiveDate {
        self.exit.date
    }

    /// Bars between entry and exit.
    pub fn trading_days(&self) -> usize {
        self.quotes.len().saturating_sub(1)
    }

    pub fn calendar_days(&self) -> i64 {
        (self.exit.date - self.entry.date).num_days()
    }

    /// Best and worst close seen while the trade was open.
    ///
    /// ATR figures are in multiples of the entry bar's ATR and stay zero
    /// when that ATR was still warming up.
    pub fn excursion(&self) -> Excursion {
        let base = self.entry.close;
        let atr = self.entry.atr;
        let in_atr = |d: f64| if atr > 0.0 { d / atr } else { 0.0 };
        let mut best = 0.0_f64;
        let mut worst = 0.0_f64;
        for q in &self.quotes {
            best = best.max(q.close - base);
            worst = worst.min(q.close - base);
        }
        Excursion {
            mfe_pct: best / base * 100.0,
            mfe_atr: in_atr(best),
            mae_pct: worst / base * 100.0,
            mae_atr: in_atr(worst).abs(),
            mfe_reached: best > 0.0,
        }
    }
}

/// Maximum favourable and adverse excursion of one trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Excursion {
    /// Best unrealised gain in percent, never negative.
    pub mfe_pct: f64,
    pub mfe_atr: f64,
    /// Worst unrealised loss in percent, never positive.
    pub mae_pct: f64,
    /// Magnitude.
    pub mae_atr: f64,
    /// The trade was in profit at some close.
    pub mfe_reached: bool,
}

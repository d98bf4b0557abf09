//! Condition tree: atomic predicates over a quote, composed with AND / OR / NOT.
//!
//! A condition is a pure function of `(stock, quote, optional entry quote,
//! optional breadth context)`. Evaluation for a quote only looks at that
//! quote and the stock's history up to it.
//!
//! The catalog is a closed enum dispatched by `match`. New predicates are
//! added as variants here and registered in [`crate::factory`].

mod composite;
mod predicates;

pub use composite::{Composite, LogicalOperator};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BreadthContext, Quote, Stock};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("NOT wraps exactly one condition, got {0}")]
    NotArity(usize),
    #[error("Unknown logical operator: {0}")]
    UnknownOperator(String),
}

/// Everything a condition may look at for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub stock: &'a Stock,
    pub quote: &'a Quote,
    /// Entry quote of the open trade, for exit-side conditions.
    pub entry: Option<&'a Quote>,
    pub breadth: Option<&'a BreadthContext>,
}

impl<'a> EvalContext<'a> {
    pub fn new(stock: &'a Stock, quote: &'a Quote) -> Self {
        Self {
            stock,
            quote,
            entry: None,
            breadth: None,
        }
    }

    pub fn with_entry(mut self, entry: &'a Quote) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_breadth(mut self, breadth: Option<&'a BreadthContext>) -> Self {
        self.breadth = breadth;
        self
    }
}

/// Per-condition diagnostic: verdict plus the value compared and what it was compared to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEvaluation {
    pub condition_type: String,
    pub description: String,
    pub passed: bool,
    pub actual_value: Option<f64>,
    pub threshold: Option<f64>,
    pub message: String,
}

/// Outcome of an atomic predicate before it is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Check {
    pub passed: bool,
    pub actual: Option<f64>,
    pub threshold: Option<f64>,
}

impl Check {
    pub fn flag(passed: bool) -> Self {
        Self {
            passed,
            actual: None,
            threshold: None,
        }
    }

    pub fn compare(passed: bool, actual: f64, threshold: f64) -> Self {
        Self {
            passed,
            actual: Some(actual),
            threshold: Some(threshold),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    // ── Constants ──
    Always,
    Never,

    // ── Price and trend ──
    /// EMA10 > EMA20 and close > EMA50.
    Uptrend,
    PriceAboveEma { period: usize },
    EmaAlignment { fast: usize, slow: usize },
    /// Fast EMA crossed above slow EMA on this bar.
    EmaBullishCross { fast: usize, slow: usize },
    AdxRange { min: f64, max: f64 },
    MinimumPrice { price: f64 },
    VolumeAboveAverage { multiplier: f64, lookback_days: usize },
    PriceNearDonchianHigh { max_distance_pct: f64 },

    // ── Breadth context ──
    MarketUptrend,
    SectorUptrend,
    SpyUptrend,
    MarketBreadthAbove { threshold: f64 },
    SectorBreadthAbove { threshold: f64 },
    /// Neither the market nor the stock's sector is in an uptrend.
    MarketAndSectorDowntrend,

    // ── Earnings and order blocks ──
    NoEarningsWithinDays { days: i64 },
    BeforeEarnings { days: i64 },
    BelowOrderBlock { percent_below: f64, age_days: usize },
    NotInOrderBlock { age_days: usize },
    BearishOrderBlock { age_days: usize },

    // ── Open-trade exits (need an entry quote) ──
    StopLoss { atr_multiplier: f64 },
    ProfitTarget { atr_multiplier: f64, ema_period: usize },
    AtrTrailingStop { atr_multiplier: f64 },
    PriceBelowEma { period: usize },
    EmaCross { fast: usize, slow: usize },
    BarsHeld { bars: usize },

    Composite(Composite),
}

impl Condition {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Composite(c) => c.evaluate(ctx),
            atomic => atomic.check(ctx).passed,
        }
    }

    /// Exit reason when this condition holds for `ctx`.
    pub fn matching_reason(&self, ctx: &EvalContext<'_>) -> Option<String> {
        match self {
            Self::Composite(c) => c.matching_reason(ctx),
            atomic => atomic.check(ctx).passed.then(|| atomic.exit_reason()),
        }
    }

    pub fn evaluate_detailed(&self, ctx: &EvalContext<'_>) -> ConditionEvaluation {
        if let Self::Composite(c) = self {
            return c.evaluate_detailed(ctx);
        }
        let check = self.check(ctx);
        let description = self.description();
        let mark = if check.passed { "✓" } else { "✗" };
        let message = match (check.actual, check.threshold) {
            (Some(a), Some(t)) => format!("{description}: {a:.2} vs {t:.2} {mark}"),
            (Some(a), None) => format!("{description}: {a:.2} {mark}"),
            _ => format!("{description} {mark}"),
        };
        ConditionEvaluation {
            condition_type: self.type_name().to_string(),
            description,
            passed: check.passed,
            actual_value: check.actual,
            threshold: check.threshold,
            message,
        }
    }

    /// Registry name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Uptrend => "uptrend",
            Self::PriceAboveEma { .. } => "price_above_ema",
            Self::EmaAlignment { .. } => "ema_alignment",
            Self::EmaBullishCross { .. } => "ema_bullish_cross",
            Self::AdxRange { .. } => "adx_range",
            Self::MinimumPrice { .. } => "minimum_price",
            Self::VolumeAboveAverage { .. } => "volume_above_average",
            Self::PriceNearDonchianHigh { .. } => "price_near_donchian_high",
            Self::MarketUptrend => "market_uptrend",
            Self::SectorUptrend => "sector_uptrend",
            Self::SpyUptrend => "spy_uptrend",
            Self::MarketBreadthAbove { .. } => "market_breadth_above",
            Self::SectorBreadthAbove { .. } => "sector_breadth_above",
            Self::MarketAndSectorDowntrend => "market_and_sector_downtrend",
            Self::NoEarningsWithinDays { .. } => "no_earnings_within_days",
            Self::BeforeEarnings { .. } => "before_earnings",
            Self::BelowOrderBlock { .. } => "below_order_block",
            Self::NotInOrderBlock { .. } => "not_in_order_block",
            Self::BearishOrderBlock { .. } => "bearish_order_block",
            Self::StopLoss { .. } => "stop_loss",
            Self::ProfitTarget { .. } => "profit_target",
            Self::AtrTrailingStop { .. } => "atr_trailing_stop",
            Self::PriceBelowEma { .. } => "price_below_ema",
            Self::EmaCross { .. } => "ema_cross",
            Self::BarsHeld { .. } => "bars_held",
            Self::Composite(c) => match c.operator() {
                LogicalOperator::And => "and",
                LogicalOperator::Or => "or",
                LogicalOperator::Not => "not",
            },
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Always => "Always".into(),
            Self::Never => "Never".into(),
            Self::Uptrend => "Stock in uptrend (EMA10 > EMA20, price > EMA50)".into(),
            Self::PriceAboveEma { period } => format!("Price above EMA{period}"),
            Self::EmaAlignment { fast, slow } => format!("EMA{fast} above EMA{slow}"),
            Self::EmaBullishCross { fast, slow } => format!("EMA{fast} crosses above EMA{slow}"),
            Self::AdxRange { min, max } => format!("ADX between {min:.0} and {max:.0}"),
            Self::MinimumPrice { price } => format!("Price at least {price:.2}"),
            Self::VolumeAboveAverage {
                multiplier,
                lookback_days,
            } => format!("Volume ≥ {multiplier:.1}× avg ({lookback_days} days)"),
            Self::PriceNearDonchianHigh { max_distance_pct } => {
                format!("Price within {max_distance_pct:.1}% of Donchian high")
            }
            Self::MarketUptrend => "Market in uptrend".into(),
            Self::SectorUptrend => "Sector in uptrend".into(),
            Self::SpyUptrend => "SPY in uptrend".into(),
            Self::MarketBreadthAbove { threshold } => format!("Market breadth above {threshold:.0}%"),
            Self::SectorBreadthAbove { threshold } => format!("Sector breadth above {threshold:.0}%"),
            Self::MarketAndSectorDowntrend => "Market and sector in downtrend".into(),
            Self::NoEarningsWithinDays { days } => format!("No earnings within {days} days"),
            Self::BeforeEarnings { days } => format!("Earnings within {days} days"),
            Self::BelowOrderBlock {
                percent_below,
                age_days,
            } => format!("Price {percent_below:.1}% below order blocks older than {age_days} days"),
            Self::NotInOrderBlock { age_days } => {
                format!("Not inside an order block older than {age_days} days")
            }
            Self::BearishOrderBlock { age_days } => {
                format!("Price entered a bearish order block older than {age_days} days")
            }
            Self::StopLoss { atr_multiplier } => format!("Stop loss ({atr_multiplier} ATR)"),
            Self::ProfitTarget {
                atr_multiplier,
                ema_period,
            } => format!("Price {atr_multiplier} ATR above EMA{ema_period}"),
            Self::AtrTrailingStop { atr_multiplier } => {
                format!("ATR trailing stop ({atr_multiplier} ATR)")
            }
            Self::PriceBelowEma { period } => format!("Price below EMA{period}"),
            Self::EmaCross { fast, slow } => format!("EMA{fast} below EMA{slow}"),
            Self::BarsHeld { bars } => format!("Held for {bars} bars"),
            Self::Composite(c) => c.description(),
        }
    }

    /// Human-readable exit reason recorded on a trade.
    pub fn exit_reason(&self) -> String {
        match self {
            Self::StopLoss { atr_multiplier } => {
                format!("Stop loss triggered ({atr_multiplier} ATR below entry)")
            }
            Self::ProfitTarget { .. } => "Profit target reached".into(),
            Self::AtrTrailingStop { atr_multiplier } => {
                format!("ATR trailing stop triggered ({atr_multiplier} ATR below highest close)")
            }
            Self::PriceBelowEma { period } => format!("Price closed below EMA{period}"),
            Self::EmaCross { fast, slow } => format!("EMA{fast} crossed below EMA{slow}"),
            Self::BeforeEarnings { days } => format!("Earnings within {days} days"),
            Self::BearishOrderBlock { .. } => "Price entered bearish order block".into(),
            Self::MarketAndSectorDowntrend => "Market and sector in downtrend".into(),
            Self::BarsHeld { bars } => format!("Time exit after {bars} bars"),
            other => other.description(),
        }
    }
}
